//! FFI-safe types with UniFFI derives.
//!
//! These types mirror waymark types but add UniFFI derives for mobile FFI.
//! Conversion is done at the FFI boundary.

use serde::{Deserialize, Serialize};
use waymark::{
    AppState, CloudSession, Effect, HoningReadout, KmzExport, Preferences, RouteDistances,
    Waypoint, WaypointRow,
};

// ============================================================================
// Core Types
// ============================================================================

/// Route checkpoint for FFI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct FfiWaypoint {
    pub name: String,
    pub expected_time: String,
    /// Empty when not yet observed
    pub actual_time: String,
    pub missed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Segment distance override in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<Waypoint> for FfiWaypoint {
    fn from(w: Waypoint) -> Self {
        Self {
            name: w.name,
            expected_time: w.expected_time,
            actual_time: w.actual_time,
            missed: w.missed,
            lat: w.lat,
            lng: w.lng,
            distance: w.distance,
        }
    }
}

impl From<FfiWaypoint> for Waypoint {
    fn from(w: FfiWaypoint) -> Self {
        Self {
            name: w.name,
            expected_time: w.expected_time,
            actual_time: w.actual_time,
            missed: w.missed,
            lat: w.lat,
            lng: w.lng,
            distance: w.distance,
        }
    }
}

/// Segment and cumulative distances for FFI, both in meters
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiRouteDistances {
    pub segments: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub total: f64,
}

impl From<RouteDistances> for FfiRouteDistances {
    fn from(d: RouteDistances) -> Self {
        Self {
            total: d.total(),
            segments: d.segments,
            cumulative: d.cumulative,
        }
    }
}

/// Marker list row for FFI
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiWaypointRow {
    pub index: u32,
    pub arrow_label: String,
    pub segment_distance: f64,
    pub cumulative_distance: f64,
    pub show_segment: bool,
    pub actual_display: String,
    pub has_coordinates: bool,
}

impl From<WaypointRow> for FfiWaypointRow {
    fn from(r: WaypointRow) -> Self {
        Self {
            index: r.index as u32,
            arrow_label: r.arrow_label,
            segment_distance: r.segment_distance,
            cumulative_distance: r.cumulative_distance,
            show_segment: r.show_segment,
            actual_display: r.actual_display,
            has_coordinates: r.has_coordinates,
        }
    }
}

/// Honing readout for FFI
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct FfiHoningReadout {
    pub distance_meters: f64,
    /// True bearing in degrees [0, 360)
    pub bearing: f64,
    /// Arrow rotation relative to the device heading, degrees [0, 360)
    pub arrow_angle: f64,
}

impl From<HoningReadout> for FfiHoningReadout {
    fn from(h: HoningReadout) -> Self {
        Self {
            distance_meters: h.distance_meters,
            bearing: h.bearing,
            arrow_angle: h.arrow_angle,
        }
    }
}

/// Hour and minute pair for the time picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct FfiHourMinute {
    pub hour: u32,
    pub minute: u32,
}

// ============================================================================
// Session Types
// ============================================================================

/// Device UI toggles for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct FfiPreferences {
    pub show_map_buttons: bool,
    pub show_honing_buttons: bool,
}

impl From<Preferences> for FfiPreferences {
    fn from(p: Preferences) -> Self {
        Self {
            show_map_buttons: p.show_map_buttons,
            show_honing_buttons: p.show_honing_buttons,
        }
    }
}

impl From<FfiPreferences> for Preferences {
    fn from(p: FfiPreferences) -> Self {
        Self {
            show_map_buttons: p.show_map_buttons,
            show_honing_buttons: p.show_honing_buttons,
        }
    }
}

/// Remote session list entry for FFI
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiCloudSession {
    pub id: String,
    pub name: String,
}

impl From<CloudSession> for FfiCloudSession {
    fn from(s: CloudSession) -> Self {
        Self { id: s.id, name: s.name }
    }
}

impl From<FfiCloudSession> for CloudSession {
    fn from(s: FfiCloudSession) -> Self {
        Self { id: s.id, name: s.name }
    }
}

/// Session document write the host must perform (merge into `session_id`).
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSaveRequest {
    pub session_id: String,
    pub payload_json: String,
}

/// Sensor command emitted by a preference change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSensorCommand {
    Unchanged,
    /// Start location and heading updates
    Start,
    StopHeading,
}

impl FfiSensorCommand {
    /// Pick the sensor command out of a list of pending effects.
    pub fn from_effects(effects: &[Effect]) -> Self {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::StartSensors => Some(Self::Start),
                Effect::StopHeading => Some(Self::StopHeading),
                _ => None,
            })
            .unwrap_or(Self::Unchanged)
    }
}

/// Result of a KMZ export for FFI
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiExportResult {
    /// Absolute path of the archive, None on failure
    pub path: Option<String>,
    pub mime_type: String,
    pub placemark_count: u32,
    pub error: Option<String>,
}

impl FfiExportResult {
    pub fn failed(message: String) -> Self {
        Self {
            path: None,
            mime_type: waymark::KMZ_MIME_TYPE.to_string(),
            placemark_count: 0,
            error: Some(message),
        }
    }
}

impl From<KmzExport> for FfiExportResult {
    fn from(e: KmzExport) -> Self {
        Self {
            path: Some(e.path.to_string_lossy().into_owned()),
            mime_type: e.mime_type.to_string(),
            placemark_count: e.placemark_count as u32,
            error: None,
        }
    }
}

/// Everything the UI renders from the session state.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiSessionSnapshot {
    pub is_authed: bool,
    pub online: bool,
    pub online_user: String,
    pub error_message: String,
    pub sessions: Vec<FfiCloudSession>,
    pub selected_session_id: String,
    pub selected_session_name: String,
    pub waypoints: Vec<FfiWaypoint>,
    pub rows: Vec<FfiWaypointRow>,
    pub has_location: bool,
    pub heading: Option<f64>,
    pub preferences: FfiPreferences,
}

impl From<&AppState> for FfiSessionSnapshot {
    fn from(s: &AppState) -> Self {
        Self {
            is_authed: s.is_authed,
            online: s.online,
            online_user: s.online_user.clone(),
            error_message: s.error_message.clone(),
            sessions: s.sessions.iter().cloned().map(Into::into).collect(),
            selected_session_id: s.selected_session_id.clone(),
            selected_session_name: s.selected_session_name().to_string(),
            waypoints: s.waypoints.iter().cloned().map(Into::into).collect(),
            rows: waymark::build_rows(&s.waypoints)
                .into_iter()
                .map(Into::into)
                .collect(),
            has_location: s.location.is_some(),
            heading: s.heading,
            preferences: s.preferences.into(),
        }
    }
}
