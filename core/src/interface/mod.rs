pub mod detection;
pub mod report;

pub use detection::{BoundingBox, DetectedObject, PixelPoint};
pub use report::{describe_count, DeliveryEvent, InfractionReport};
