//! Segment and cumulative distances along a waypoint sequence.
//!
//! The segment reported at index `i` is the leg from waypoint `i - 1` to
//! waypoint `i`, so the first waypoint always reports zero and the cumulative
//! distance at `i` is the distance travelled to reach it.
//!
//! A waypoint's `distance` override describes the leg leaving it (towards the
//! next waypoint) and replaces the geometric distance for that leg.

use serde::{Deserialize, Serialize};

use crate::Waypoint;
use crate::geo_utils::haversine_distance;

/// Per-index distances for a whole route, in meters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDistances {
    /// Leg from the previous waypoint; `segments[0] == 0.0`
    pub segments: Vec<f64>,
    /// Prefix sums of `segments`
    pub cumulative: Vec<f64>,
}

impl RouteDistances {
    /// Total route length in meters.
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}

/// Distance of the leg from `from` to `to` in meters.
///
/// Uses `from.distance` verbatim when present; otherwise the great-circle
/// distance when both ends have coordinates; otherwise zero.
pub fn segment_distance(from: &Waypoint, to: &Waypoint) -> f64 {
    if let Some(meters) = from.distance {
        return meters;
    }
    match (from.position(), to.position()) {
        (Some(a), Some(b)) => haversine_distance(&a, &b),
        _ => 0.0,
    }
}

/// Segment distance for every index (index 0 is always zero).
pub fn segment_distances(waypoints: &[Waypoint]) -> Vec<f64> {
    let mut segments = Vec::with_capacity(waypoints.len());
    if waypoints.is_empty() {
        return segments;
    }
    segments.push(0.0);
    segments.extend(waypoints.windows(2).map(|w| segment_distance(&w[0], &w[1])));
    segments
}

/// Running totals of a segment list.
pub fn cumulative_distances(segments: &[f64]) -> Vec<f64> {
    segments
        .iter()
        .scan(0.0, |total, d| {
            *total += d;
            Some(*total)
        })
        .collect()
}

/// Segment and cumulative distances for a whole route.
pub fn route_distances(waypoints: &[Waypoint]) -> RouteDistances {
    let segments = segment_distances(waypoints);
    let cumulative = cumulative_distances(&segments);
    RouteDistances {
        segments,
        cumulative,
    }
}

/// Render meters with exactly one decimal and a `.` separator (`123.4`).
pub fn format_distance(meters: f64) -> String {
    format!("{:.1}", meters)
}
