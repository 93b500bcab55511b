pub mod calibration;
pub mod interval;
pub mod segments;
pub mod zone;

pub use calibration::{PixelScale, PointOutcome, ZoneCalibrator};
pub use interval::{merge_intervals, occupied_length, OccupiedInterval};
pub use segments::{free_segments, FreeSegment, FreeSpaceReport};
pub use zone::{classify, RestrictedZone, ZoneOccupancy};
