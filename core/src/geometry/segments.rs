use crate::geometry::calibration::PixelScale;
use crate::geometry::interval::OccupiedInterval;
use crate::prelude::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};

/// Unoccupied stretch of curb long enough to be usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeSegment {
    pub start_px: f64,
    pub end_px: f64,
    pub length: f64,
}

/// Free segments of one frame and their aggregate length in real units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpaceReport {
    pub segments: Vec<FreeSegment>,
    pub total_free: f64,
    pub span_length: f64,
}

/// Gaps between merged intervals across `[0, span_px]` that are at least
/// `min_length` real units long.
///
/// `total_free` sums only the retained segments. Sub-threshold gaps are
/// physically free but excluded, so it is not `span - occupied`.
pub fn free_segments(
    intervals: &[OccupiedInterval],
    span_px: f64,
    scale: Option<PixelScale>,
    min_length: f64,
) -> MonitorResult<FreeSpaceReport> {
    let scale = scale.ok_or(MonitorError::CalibrationIncomplete)?;
    if !span_px.is_finite() || span_px < 0.0 {
        return Err(MonitorError::InvalidInput(format!(
            "span must be non-negative, got {}",
            span_px
        )));
    }

    let mut segments = Vec::new();
    let mut cursor = 0.0_f64;
    let mut push_gap = |from: f64, to: f64| {
        if to <= from {
            return;
        }
        let length = scale.to_units(to - from);
        if length >= min_length {
            segments.push(FreeSegment {
                start_px: from,
                end_px: to,
                length,
            });
        }
    };

    for interval in intervals {
        let start = interval.start.clamp(0.0, span_px);
        let end = interval.end.clamp(0.0, span_px);
        push_gap(cursor, start);
        cursor = cursor.max(end);
    }
    push_gap(cursor, span_px);

    let total_free = segments.iter().map(|segment| segment.length).sum();
    Ok(FreeSpaceReport {
        segments,
        total_free,
        span_length: scale.to_units(span_px),
    })
}
