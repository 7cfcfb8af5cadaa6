//! Mapping between the cloud session document and [`Waypoint`].
//!
//! ## Wire shape, version 1
//!
//! Read:
//! ```text
//! { "state": { "pts": [ row, ... ] } }     // or a top-level "pts" array
//! row = {
//!   "name" | "markername":          string,
//!   "expectedTime" | "expectedtime": string,
//!   "actualTime" | "time":          string,
//!   "missed":                       bool,
//!   "lat" | "latitude":             number | numeric string,
//!   "lng" | "longitude":            number | numeric string,
//!   "distance" | "dist":            number | numeric string
//! }
//! ```
//! The first spelling wins when both carry a value of the right type.
//! Numeric strings may use `,` or `.` as the decimal separator.
//!
//! Write (merged into the same document):
//! ```text
//! { "schemaVersion": 1,
//!   "state": { "pts": [ { "markername", "expectedtime", "time", "missed",
//!                         "latitude", "longitude", "distance"? } ] } }
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Waypoint;
use crate::error::Result;

/// Version of the document shape written by [`to_wire_payload`].
pub const SCHEMA_VERSION: u32 = 1;

/// One entry of the remote session list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSession {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Read side
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct WireRow {
    name: Option<Value>,
    markername: Option<Value>,
    #[serde(rename = "expectedTime")]
    expected_time: Option<Value>,
    expectedtime: Option<Value>,
    #[serde(rename = "actualTime")]
    actual_time: Option<Value>,
    time: Option<Value>,
    missed: Option<Value>,
    lat: Option<Value>,
    latitude: Option<Value>,
    lng: Option<Value>,
    longitude: Option<Value>,
    distance: Option<Value>,
    dist: Option<Value>,
}

impl WireRow {
    fn into_waypoint(self) -> Waypoint {
        Waypoint {
            name: first_string(&self.name, &self.markername),
            expected_time: first_string(&self.expected_time, &self.expectedtime),
            actual_time: first_string(&self.actual_time, &self.time),
            missed: self.missed.as_ref().and_then(Value::as_bool).unwrap_or(false),
            lat: first_number(&self.lat, &self.latitude),
            lng: first_number(&self.lng, &self.longitude),
            distance: first_number(&self.distance, &self.dist),
        }
    }
}

fn first_string(primary: &Option<Value>, alternate: &Option<Value>) -> String {
    primary
        .as_ref()
        .and_then(Value::as_str)
        .or_else(|| alternate.as_ref().and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn first_number(primary: &Option<Value>, alternate: &Option<Value>) -> Option<f64> {
    primary
        .as_ref()
        .and_then(parse_number)
        .or_else(|| alternate.as_ref().and_then(parse_number))
}

/// A JSON number, or a string holding one with `.` or `,` as decimal point.
///
/// Blank, malformed and non-finite values are `None`.
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.replace(',', ".").parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Waypoints from a decoded session document. Non-object rows are skipped.
pub fn waypoints_from_document(document: &Value) -> Vec<Waypoint> {
    if let Some(version) = document.get("schemaVersion").and_then(Value::as_u64) {
        if version > u64::from(SCHEMA_VERSION) {
            debug!(
                "[Schema] Document written with schema {}, reading as {}",
                version, SCHEMA_VERSION
            );
        }
    }

    let rows = document
        .get("state")
        .and_then(|state| state.get("pts"))
        .or_else(|| document.get("pts"))
        .and_then(Value::as_array);

    let Some(rows) = rows else {
        return Vec::new();
    };

    rows.iter()
        .filter(|row| row.is_object())
        .filter_map(|row| WireRow::deserialize(row).ok())
        .map(WireRow::into_waypoint)
        .collect()
}

/// Parse a session document from JSON text.
pub fn parse_session_document(json: &str) -> Result<Vec<Waypoint>> {
    let document: Value = serde_json::from_str(json)?;
    Ok(waypoints_from_document(&document))
}

/// Parse the session list: an array of `{ "id": ..., "name": ... }`.
///
/// Entries without a string id are skipped; a missing name falls back to the id.
pub fn parse_session_list(json: &str) -> Result<Vec<CloudSession>> {
    let value: Value = serde_json::from_str(json)?;
    let sessions = value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let id = entry.get("id")?.as_str()?.to_string();
                    let name = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| id.clone());
                    Some(CloudSession { id, name })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(sessions)
}

// ============================================================================
// Write side
// ============================================================================

/// Full replacement payload for the session document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePayload {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub state: WireState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireState {
    pub pts: Vec<WirePoint>,
}

/// A waypoint in the lower-case write spelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirePoint {
    pub markername: String,
    pub expectedtime: String,
    pub time: String,
    pub missed: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<&Waypoint> for WirePoint {
    fn from(w: &Waypoint) -> Self {
        Self {
            markername: w.name.clone(),
            expectedtime: w.expected_time.clone(),
            time: w.actual_time.clone(),
            missed: w.missed,
            latitude: w.lat,
            longitude: w.lng,
            distance: w.distance,
        }
    }
}

pub fn to_wire_payload(waypoints: &[Waypoint]) -> WirePayload {
    WirePayload {
        schema_version: SCHEMA_VERSION,
        state: WireState {
            pts: waypoints.iter().map(WirePoint::from).collect(),
        },
    }
}

/// The write payload as JSON text.
pub fn payload_json(waypoints: &[Waypoint]) -> Result<String> {
    Ok(serde_json::to_string(&to_wire_payload(waypoints))?)
}
