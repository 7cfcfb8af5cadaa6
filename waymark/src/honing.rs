//! Live distance and direction from the device to a waypoint.

use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, initial_bearing, normalize_degrees};
use crate::{GpsPoint, Waypoint};

/// What the honing dialog shows for one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoningReadout {
    /// Distance to the target in meters
    pub distance_meters: f64,
    /// Initial bearing to the target, degrees clockwise from true north [0, 360)
    pub bearing: f64,
    /// Arrow rotation relative to the device; equals `bearing` without a heading
    pub arrow_angle: f64,
}

/// Rotate a bearing into a device-relative arrow angle.
///
/// `(bearing - heading + 360) mod 360` when a heading is known.
pub fn arrow_angle(bearing: f64, heading: Option<f64>) -> f64 {
    match heading {
        Some(h) => normalize_degrees(bearing - h),
        None => normalize_degrees(bearing),
    }
}

/// Turn a raw azimuth (which may be negative) into a heading in [0, 360).
pub fn heading_from_azimuth(azimuth_degrees: f64) -> f64 {
    normalize_degrees(azimuth_degrees)
}

/// Readout from `current` to `target`, or `None` while either position is unknown.
pub fn hone(current: Option<GpsPoint>, target: &Waypoint, heading: Option<f64>) -> Option<HoningReadout> {
    let from = current?;
    let to = target.position()?;
    let bearing = initial_bearing(&from, &to);
    Some(HoningReadout {
        distance_meters: haversine_distance(&from, &to),
        bearing,
        arrow_angle: arrow_angle(bearing, heading),
    })
}
