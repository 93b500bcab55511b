pub mod delivery;
pub mod emitter;

pub use delivery::{DeliveryWorker, Reporter};
pub use emitter::{channel, EmitOutcome, EventEmitter};
