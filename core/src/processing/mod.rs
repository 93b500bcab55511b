pub mod curb;
pub mod debounce;
pub mod filter;
pub mod occupancy;

pub use curb::CurbStage;
pub use debounce::{StabilityDebouncer, StabilityState, StableEvent};
pub use filter::DetectionFilterStage;
pub use occupancy::ZoneStage;
