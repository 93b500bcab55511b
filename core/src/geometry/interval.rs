use crate::geometry::calibration::PixelScale;
use serde::{Deserialize, Serialize};

/// Contiguous pixel range on the curb axis covered by one or more vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupiedInterval {
    pub start: f64,
    pub end: f64,
}

impl OccupiedInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Merges `[xmin, xmax]` ranges whose gap is at most `tolerance` pixels.
///
/// The result is sorted by start and pairwise disjoint. Ranges with inverted
/// bounds are normalized first.
pub fn merge_intervals<I>(ranges: I, tolerance: f64) -> Vec<OccupiedInterval>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut sorted: Vec<OccupiedInterval> = ranges
        .into_iter()
        .map(|(a, b)| OccupiedInterval::new(a.min(b), a.max(b)))
        .collect();
    sorted.sort_by(|lhs, rhs| lhs.start.total_cmp(&rhs.start));

    let mut merged: Vec<OccupiedInterval> = Vec::with_capacity(sorted.len());
    for next in sorted {
        match merged.last_mut() {
            Some(current) if next.start <= current.end + tolerance => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Occupied real length, capped at `span_units` to absorb box-overlap artifacts.
pub fn occupied_length(intervals: &[OccupiedInterval], scale: PixelScale, span_units: f64) -> f64 {
    let pixels: f64 = intervals.iter().map(OccupiedInterval::length).sum();
    scale.to_units(pixels).min(span_units)
}
