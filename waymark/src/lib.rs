//! # Waymark
//!
//! Route progress calculations for field recording of timed waypoint
//! observations ("markers").
//!
//! This library provides:
//! - Segment and cumulative distances along an ordered waypoint sequence
//! - Schedule shifting: late/early observations cascade to downstream expected times
//! - KML 2.2 / KMZ export of the waypoints that carry coordinates
//! - Honing readouts (distance, bearing, device-relative arrow angle)
//! - A versioned mapping for the cloud session document
//! - An explicit state reducer for the app session
//!
//! ## Quick Start
//!
//! ```rust
//! use waymark::{Waypoint, shift_expected_times};
//!
//! let route = vec![
//!     Waypoint::new("Start", "08:00"),
//!     Waypoint::new("Mid", "08:30"),
//!     Waypoint::new("End", "09:00"),
//! ];
//!
//! // Ten minutes late at the start: everything after it moves by ten minutes.
//! let shifted = shift_expected_times(&route, 0, "08:10", false);
//! assert_eq!(shifted[1].expected_time, "08:40:00");
//! assert_eq!(shifted[2].expected_time, "09:10:00");
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, WaymarkError};

// Geographic utilities (haversine distance, bearing)
pub mod geo_utils;

// Wall-clock parsing and formatting
pub mod timefmt;
pub use timefmt::{format_time_from_seconds, parse_time_to_seconds};

// Segment and cumulative distances
pub mod distance;
pub use distance::{RouteDistances, format_distance, route_distances, segment_distance};

// Expected-time cascade after an observation
pub mod schedule;
pub use schedule::shift_expected_times;

// KML document generation
pub mod kml;
pub use kml::{KmlConfig, build_kml};

// KMZ packaging
pub mod export;
pub use export::{ExportConfig, KMZ_MIME_TYPE, KmzExport, build_kmz_bytes, export_kmz};

// Live bearing/distance to a waypoint
pub mod honing;
pub use honing::{HoningReadout, arrow_angle, hone};

// Cloud document mapping
pub mod schema;
pub use schema::{CloudSession, SCHEMA_VERSION};

// Display rows for the marker list
pub mod progress;
pub use progress::{WaypointRow, build_rows, geo_uri};

// App session state and reducer
pub mod state;
pub use state::{AppEvent, AppState, Effect, Preferences, Transition, reduce};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude (WGS84 degrees).
///
/// # Example
/// ```
/// use waymark::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One route checkpoint.
///
/// Waypoints live in an ordered sequence owned by the caller; the order is the
/// route order. Core operations never reorder or resize the sequence, they
/// only replace fields of individual elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    /// Display label, non-unique, may be empty
    pub name: String,
    /// Planned time, `HH:MM` or `HH:MM:SS`
    pub expected_time: String,
    /// Recorded observation time, empty when not yet observed
    pub actual_time: String,
    /// Explicitly marked as not detected
    pub missed: bool,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Override for the segment distance to the next waypoint, in meters
    pub distance: Option<f64>,
}

impl Waypoint {
    /// Create a waypoint with a name and expected time and nothing else.
    pub fn new(name: impl Into<String>, expected_time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected_time: expected_time.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper to attach coordinates.
    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    /// Builder-style helper to attach a segment distance override.
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance = Some(meters);
        self
    }

    /// The waypoint position, when both coordinates are known.
    pub fn position(&self) -> Option<GpsPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GpsPoint::new(lat, lng)),
            _ => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.position().is_some()
    }

    /// Text shown for the actual-time slot of the marker card.
    pub fn actual_display(&self) -> &str {
        if self.missed {
            "Not Detected"
        } else if self.actual_time.trim().is_empty() {
            "--:--"
        } else {
            &self.actual_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_point_validity() {
        assert!(GpsPoint::new(45.0, 7.0).is_valid());
        assert!(!GpsPoint::new(91.0, 7.0).is_valid());
        assert!(!GpsPoint::new(45.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        let mut wp = Waypoint::new("A", "08:00");
        assert_eq!(wp.position(), None);
        wp.lat = Some(1.0);
        assert_eq!(wp.position(), None);
        wp.lng = Some(2.0);
        assert_eq!(wp.position(), Some(GpsPoint::new(1.0, 2.0)));
    }

    #[test]
    fn test_actual_display() {
        let mut wp = Waypoint::new("A", "08:00");
        assert_eq!(wp.actual_display(), "--:--");
        wp.actual_time = "08:03".to_string();
        assert_eq!(wp.actual_display(), "08:03");
        wp.missed = true;
        assert_eq!(wp.actual_display(), "Not Detected");
    }
}
