//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose Rust functionality
//! to Kotlin and Swift. All FFI functions are prefixed with `ffi_` to avoid
//! naming conflicts with the internal API.
//!
//! Stateless calculations take and return plain records. Session functions
//! go through the global [`SESSION_ENGINE`](crate::SESSION_ENGINE); effects the
//! host has to carry out come back as return values.

use std::path::Path;
use std::time::Instant;

use log::{info, warn};
use waymark::schema::{parse_session_document, parse_session_list};
use waymark::timefmt::{format_hour_minute, parse_hour_minute};
use waymark::{AppEvent, Effect, GpsPoint, KmlConfig, Waypoint};

use crate::ffi_types::{
    FfiCloudSession, FfiExportResult, FfiHoningReadout, FfiHourMinute, FfiPreferences,
    FfiRouteDistances, FfiSaveRequest, FfiSensorCommand, FfiSessionSnapshot, FfiWaypoint,
    FfiWaypointRow,
};
use crate::persistence::PreferenceStore;
use crate::session::{SESSION_ENGINE, SessionEngine, with_session_engine};
use crate::{elapsed_ms, init_logging};

const LOAD_FAILED: &str = "Unable to load session.";
const LIST_FAILED: &str = "Unable to list sessions.";

fn to_core(waypoints: Vec<FfiWaypoint>) -> Vec<Waypoint> {
    waypoints.into_iter().map(Into::into).collect()
}

// ============================================================================
// Stateless Calculations
// ============================================================================

/// Segment and cumulative distances for a waypoint list.
#[uniffi::export]
pub fn ffi_route_distances(waypoints: Vec<FfiWaypoint>) -> FfiRouteDistances {
    waymark::route_distances(&to_core(waypoints)).into()
}

/// Display rows for the marker list.
#[uniffi::export]
pub fn ffi_build_rows(waypoints: Vec<FfiWaypoint>) -> Vec<FfiWaypointRow> {
    waymark::build_rows(&to_core(waypoints))
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Record an observation on a detached list and cascade the delta downstream.
#[uniffi::export]
pub fn ffi_shift_expected_times(
    waypoints: Vec<FfiWaypoint>,
    index: u32,
    actual_time: String,
    missed: bool,
) -> Vec<FfiWaypoint> {
    init_logging();
    waymark::shift_expected_times(&to_core(waypoints), index as usize, &actual_time, missed)
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Distance in meters with one decimal, no unit.
#[uniffi::export]
pub fn ffi_format_distance(meters: f64) -> String {
    waymark::format_distance(meters)
}

/// KML document text for a waypoint list. Returns None if writing fails.
#[uniffi::export]
pub fn ffi_build_kml(waypoints: Vec<FfiWaypoint>, project_name: String) -> Option<String> {
    init_logging();
    match waymark::build_kml(&to_core(waypoints), &project_name, &KmlConfig::default()) {
        Ok(kml) => Some(kml),
        Err(e) => {
            warn!("[RUST: build_kml] Failed: {}", e);
            None
        }
    }
}

/// Parse a session document into waypoints. Returns None for malformed JSON.
#[uniffi::export]
pub fn ffi_parse_session_document(json: String) -> Option<Vec<FfiWaypoint>> {
    init_logging();
    match parse_session_document(&json) {
        Ok(waypoints) => Some(waypoints.into_iter().map(Into::into).collect()),
        Err(e) => {
            warn!("[RUST: parse_session_document] {}", e);
            None
        }
    }
}

/// Serialize waypoints into the session document write payload.
#[uniffi::export]
pub fn ffi_session_payload(waypoints: Vec<FfiWaypoint>) -> Option<String> {
    waymark::schema::payload_json(&to_core(waypoints)).ok()
}

/// Arrow rotation for a bearing given the device heading.
#[uniffi::export]
pub fn ffi_arrow_angle(bearing: f64, heading: Option<f64>) -> f64 {
    waymark::arrow_angle(bearing, heading)
}

/// Distance and bearing from a position to a waypoint.
#[uniffi::export]
pub fn ffi_hone(
    latitude: f64,
    longitude: f64,
    target: FfiWaypoint,
    heading: Option<f64>,
) -> Option<FfiHoningReadout> {
    waymark::hone(
        Some(GpsPoint::new(latitude, longitude)),
        &target.into(),
        heading,
    )
    .map(Into::into)
}

/// Map app link for a waypoint, None when it has no coordinates.
#[uniffi::export]
pub fn ffi_geo_uri(waypoint: FfiWaypoint) -> Option<String> {
    waymark::geo_uri(&waypoint.into())
}

#[uniffi::export]
pub fn ffi_kmz_mime_type() -> String {
    waymark::KMZ_MIME_TYPE.to_string()
}

/// Seed values for the time picker; `00:00` when the text is not a time.
#[uniffi::export]
pub fn ffi_parse_hour_minute(value: String) -> FfiHourMinute {
    let (hour, minute) = parse_hour_minute(&value);
    FfiHourMinute { hour, minute }
}

#[uniffi::export]
pub fn ffi_format_hour_minute(hour: u32, minute: u32) -> String {
    format_hour_minute(hour, minute)
}

// ============================================================================
// Session Engine
// ============================================================================

/// Open the preferences database and reset the session engine around it.
///
/// Returns the sensor command implied by the stored toggles, or None when the
/// database could not be opened.
#[uniffi::export]
pub fn ffi_session_init(db_path: String) -> Option<FfiSensorCommand> {
    init_logging();
    let start = Instant::now();
    info!("[SessionEngine] Initializing with db: {}", db_path);

    let store = match PreferenceStore::new(&db_path) {
        Ok(store) => store,
        Err(e) => {
            warn!("[SessionEngine] Failed to open preference store: {}", e);
            return None;
        }
    };
    let (engine, effects) = match SessionEngine::with_store(store) {
        Ok(opened) => opened,
        Err(e) => {
            warn!("[SessionEngine] Failed to load preferences: {}", e);
            return None;
        }
    };

    let mut guard = SESSION_ENGINE.lock().ok()?;
    *guard = engine;
    info!("[SessionEngine] Initialized ({} ms)", elapsed_ms(start));
    Some(FfiSensorCommand::from_effects(&effects))
}

/// Whether a preference store is attached to the session engine.
#[uniffi::export]
pub fn ffi_session_is_initialized() -> bool {
    with_session_engine(|e| e.has_store()).unwrap_or(false)
}

#[uniffi::export]
pub fn ffi_session_snapshot() -> Option<FfiSessionSnapshot> {
    with_session_engine(|e| FfiSessionSnapshot::from(e.state()))
}

#[uniffi::export]
pub fn ffi_sign_in(user_name: String) {
    init_logging();
    with_session_engine(|e| e.dispatch(AppEvent::SignedIn { user_name }));
}

#[uniffi::export]
pub fn ffi_sign_in_failed(message: String) {
    with_session_engine(|e| e.dispatch(AppEvent::SignInFailed { message }));
}

#[uniffi::export]
pub fn ffi_sign_out() {
    with_session_engine(|e| e.dispatch(AppEvent::SignedOut));
}

/// Feed the session list JSON from the remote store.
#[uniffi::export]
pub fn ffi_sessions_listed(json: String) -> bool {
    init_logging();
    with_session_engine(|e| match parse_session_list(&json) {
        Ok(sessions) => {
            info!("[SessionEngine] {} sessions listed", sessions.len());
            e.dispatch(AppEvent::SessionsListed(sessions));
            true
        }
        Err(err) => {
            warn!("[SessionEngine] Session list rejected: {}", err);
            e.dispatch(AppEvent::RemoteError {
                message: LIST_FAILED.to_string(),
            });
            false
        }
    })
    .unwrap_or(false)
}

/// Replace the session list directly.
#[uniffi::export]
pub fn ffi_set_sessions(sessions: Vec<FfiCloudSession>) {
    let sessions = sessions.into_iter().map(Into::into).collect();
    with_session_engine(|e| e.dispatch(AppEvent::SessionsListed(sessions)));
}

#[uniffi::export]
pub fn ffi_select_session(session_id: String) {
    with_session_engine(|e| e.dispatch(AppEvent::SessionSelected(session_id)));
}

/// Feed a session document fetched from the remote store.
#[uniffi::export]
pub fn ffi_load_session(session_id: String, json: String) -> bool {
    init_logging();
    let start = Instant::now();
    with_session_engine(|e| match parse_session_document(&json) {
        Ok(waypoints) => {
            info!(
                "[SessionEngine] Loaded session {} with {} waypoints ({} ms)",
                session_id,
                waypoints.len(),
                elapsed_ms(start)
            );
            e.dispatch(AppEvent::SessionLoaded {
                id: session_id,
                waypoints,
            });
            true
        }
        Err(err) => {
            warn!("[SessionEngine] Session {} rejected: {}", session_id, err);
            e.dispatch(AppEvent::RemoteError {
                message: LOAD_FAILED.to_string(),
            });
            false
        }
    })
    .unwrap_or(false)
}

/// Report a failed remote read or write.
#[uniffi::export]
pub fn ffi_remote_error(message: String) {
    with_session_engine(|e| e.dispatch(AppEvent::RemoteError { message }));
}

/// Record an observation. Returns the document write to perform, if any.
#[uniffi::export]
pub fn ffi_record_observation(index: u32, time: String, missed: bool) -> Option<FfiSaveRequest> {
    init_logging();
    let effects = with_session_engine(|e| {
        e.dispatch(AppEvent::ObservationRecorded {
            index: index as usize,
            time,
            missed,
        })
    })?;
    save_request(effects)
}

fn save_request(effects: Vec<Effect>) -> Option<FfiSaveRequest> {
    effects.into_iter().find_map(|effect| match effect {
        Effect::SaveSession { session_id, payload } => match serde_json::to_string(&payload) {
            Ok(payload_json) => Some(FfiSaveRequest {
                session_id,
                payload_json,
            }),
            Err(e) => {
                warn!("[SessionEngine] Failed to encode save payload: {}", e);
                None
            }
        },
        _ => None,
    })
}

#[uniffi::export]
pub fn ffi_update_location(latitude: f64, longitude: f64) {
    let point = GpsPoint::new(latitude, longitude);
    let point = point.is_valid().then_some(point);
    with_session_engine(|e| e.dispatch(AppEvent::LocationUpdated(point)));
}

#[uniffi::export]
pub fn ffi_clear_location() {
    with_session_engine(|e| e.dispatch(AppEvent::LocationUpdated(None)));
}

/// Raw azimuth in degrees, any range. None when the sensor is unavailable.
#[uniffi::export]
pub fn ffi_update_heading(azimuth: Option<f64>) {
    with_session_engine(|e| e.dispatch(AppEvent::HeadingUpdated(azimuth)));
}

/// Honing readout toward the waypoint at `index` from the last known location.
#[uniffi::export]
pub fn ffi_honing(index: u32) -> Option<FfiHoningReadout> {
    with_session_engine(|e| e.state().honing(index as usize))
        .flatten()
        .map(Into::into)
}

#[uniffi::export]
pub fn ffi_preferences() -> Option<FfiPreferences> {
    with_session_engine(|e| e.state().preferences.into())
}

#[uniffi::export]
pub fn ffi_set_show_map_buttons(enabled: bool) {
    with_session_engine(|e| e.dispatch(AppEvent::ShowMapButtonsChanged(enabled)));
}

/// Toggle the honing buttons. Returns what to do with the sensors.
#[uniffi::export]
pub fn ffi_set_show_honing_buttons(enabled: bool) -> FfiSensorCommand {
    with_session_engine(|e| e.dispatch(AppEvent::ShowHoningButtonsChanged(enabled)))
        .map(|effects| FfiSensorCommand::from_effects(&effects))
        .unwrap_or(FfiSensorCommand::Unchanged)
}

/// Export the loaded session as a KMZ archive in `out_dir`.
#[uniffi::export]
pub fn ffi_export_kmz(out_dir: String) -> FfiExportResult {
    init_logging();
    let start = Instant::now();
    let result = with_session_engine(|e| e.export_kmz(Path::new(&out_dir)));
    match result {
        Some(Ok(export)) => {
            info!(
                "[RUST: export_kmz] Wrote {} placemarks to {} ({} ms)",
                export.placemark_count,
                export.path.display(),
                elapsed_ms(start)
            );
            export.into()
        }
        Some(Err(e)) => FfiExportResult::failed(e.to_string()),
        None => FfiExportResult::failed("Session engine unavailable".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Vec<FfiWaypoint> {
        vec![
            Waypoint::new("Start", "08:00").at(46.5, 8.0).into(),
            Waypoint::new("Mid", "08:30").at(46.501, 8.0).into(),
            Waypoint::new("End", "09:00").into(),
        ]
    }

    #[test]
    fn test_ffi_shift_expected_times() {
        let shifted = ffi_shift_expected_times(route(), 0, "08:10".to_string(), false);
        assert_eq!(shifted[0].actual_time, "08:10");
        assert_eq!(shifted[1].expected_time, "08:40:00");
        assert_eq!(shifted[2].expected_time, "09:10:00");
    }

    #[test]
    fn test_ffi_route_distances_and_rows() {
        let distances = ffi_route_distances(route());
        assert_eq!(distances.segments.len(), 3);
        assert_eq!(distances.cumulative[0], 0.0);
        assert_eq!(distances.total, distances.cumulative[2]);

        let rows = ffi_build_rows(route());
        assert_eq!(rows[2].index, 2);
        assert_eq!(rows[2].arrow_label, "Mid → End");
    }

    #[test]
    fn test_ffi_build_kml_skips_unplaced() {
        let kml = ffi_build_kml(route(), "Ridge".to_string()).unwrap();
        assert_eq!(kml.matches("<Placemark>").count(), 2);
    }

    #[test]
    fn test_ffi_parse_session_document_rejects_garbage() {
        assert!(ffi_parse_session_document("not json".to_string()).is_none());
        let parsed = ffi_parse_session_document(r#"{"pts":[{"name":"A"}]}"#.to_string()).unwrap();
        assert_eq!(parsed[0].name, "A");
    }

    #[test]
    fn test_ffi_geo_uri() {
        let [start, _, end]: [FfiWaypoint; 3] = route().try_into().unwrap();
        assert_eq!(
            ffi_geo_uri(start).as_deref(),
            Some("geo:46.5,8.0?q=46.5,8.0(Start)")
        );
        assert!(ffi_geo_uri(end).is_none());
    }

    #[test]
    fn test_ffi_hour_minute_helpers() {
        assert_eq!(
            ffi_parse_hour_minute("07:45:10".to_string()),
            FfiHourMinute { hour: 7, minute: 45 }
        );
        assert_eq!(ffi_format_hour_minute(7, 5), "07:05");
    }

    #[test]
    fn test_ffi_hone_needs_target_coordinates() {
        let target: FfiWaypoint = Waypoint::new("T", "").into();
        assert!(ffi_hone(0.0, 0.0, target, None).is_none());

        let target: FfiWaypoint = Waypoint::new("T", "").at(0.0, 0.01).into();
        let readout = ffi_hone(0.0, 0.0, target, Some(90.0)).unwrap();
        assert!((readout.bearing - 90.0).abs() < 0.01);
        assert!(readout.arrow_angle < 0.01 || readout.arrow_angle > 359.99);
    }

    // The only test in this crate that touches SESSION_ENGINE.
    #[test]
    fn test_ffi_session_init_reports_sensor_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("prefs.db").to_string_lossy().into_owned();

        assert_eq!(ffi_session_init(db_path.clone()), Some(FfiSensorCommand::Start));
        assert!(ffi_session_is_initialized());
        assert_eq!(ffi_set_show_honing_buttons(false), FfiSensorCommand::StopHeading);

        // Reopening reads the stored toggle, so nothing needs starting.
        assert_eq!(ffi_session_init(db_path), Some(FfiSensorCommand::Unchanged));
        assert_eq!(
            ffi_preferences().map(|p| p.show_honing_buttons),
            Some(false)
        );

        let missing = dir.path().join("no-such-dir").join("prefs.db");
        assert_eq!(ffi_session_init(missing.to_string_lossy().into_owned()), None);
    }

    #[test]
    fn test_save_request_encodes_payload() {
        let effects = vec![
            Effect::StartSensors,
            Effect::SaveSession {
                session_id: "s1".to_string(),
                payload: waymark::schema::to_wire_payload(&[Waypoint::new("A", "08:00")]),
            },
        ];
        let request = save_request(effects).unwrap();
        assert_eq!(request.session_id, "s1");
        assert!(request.payload_json.contains("\"markername\":\"A\""));
        assert!(request.payload_json.contains("\"schemaVersion\":1"));
        assert!(save_request(vec![Effect::StopHeading]).is_none());
    }
}
