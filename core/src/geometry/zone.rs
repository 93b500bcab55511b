use crate::interface::{DetectedObject, PixelPoint};
use crate::prelude::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};

/// Axis-aligned restricted rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestrictedZone {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl RestrictedZone {
    pub const DEFAULT: RestrictedZone = RestrictedZone {
        x1: 100.0,
        y1: 300.0,
        x2: 550.0,
        y2: 350.0,
    };

    /// Builds a zone from two opposite corners in any order.
    ///
    /// Each side must be longer than `min_extent` pixels, and longer than zero
    /// regardless of `min_extent`.
    pub fn from_corners(a: PixelPoint, b: PixelPoint, min_extent: f64) -> MonitorResult<Self> {
        let zone = Self {
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        };
        zone.validate(min_extent)?;
        Ok(zone)
    }

    pub fn validate(&self, min_extent: f64) -> MonitorResult<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|value| !value.is_finite()) {
            return Err(MonitorError::InvalidZoneGeometry(
                "non-finite coordinate".to_string(),
            ));
        }
        let (width, height) = (self.x2 - self.x1, self.y2 - self.y1);
        if width <= 0.0 || height <= 0.0 {
            return Err(MonitorError::InvalidZoneGeometry(format!(
                "zero or negative area ({} x {})",
                width, height
            )));
        }
        if width <= min_extent || height <= min_extent {
            return Err(MonitorError::InvalidZoneGeometry(format!(
                "sides must exceed {} px ({} x {})",
                min_extent, width, height
            )));
        }
        Ok(())
    }

    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, point: PixelPoint) -> bool {
        (self.x1..=self.x2).contains(&point.x) && (self.y1..=self.y2).contains(&point.y)
    }
}

impl Default for RestrictedZone {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Objects whose box center falls inside the zone.
#[derive(Debug, Clone)]
pub struct ZoneOccupancy {
    pub count: usize,
    pub occupants: Vec<DetectedObject>,
}

pub fn classify(objects: &[DetectedObject], zone: &RestrictedZone) -> ZoneOccupancy {
    let occupants: Vec<DetectedObject> = objects
        .iter()
        .filter(|object| zone.contains(object.bbox.center()))
        .cloned()
        .collect();
    ZoneOccupancy {
        count: occupants.len(),
        occupants,
    }
}
