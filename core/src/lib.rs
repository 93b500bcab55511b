//! Curb occupancy and restricted-zone analytics for the curbwatch monitor.
//!
//! Detector output flows through filtering, interval geometry and zone
//! classification stages; a per-session debouncer decides when a zone count
//! is stable enough to report, and reports leave through a bounded queue.

pub mod geometry;
pub mod interface;
pub mod prelude;
pub mod processing;
pub mod reporting;
pub mod session;
pub mod telemetry;

pub use prelude::{EngineConfig, MonitorError, MonitorResult, ProcessingStage, StageInput, StageOutput};
pub use session::{CurbStatus, FrameInput, FrameReport, MonitorSession};
