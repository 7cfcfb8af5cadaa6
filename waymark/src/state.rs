//! App session state as an immutable snapshot and a reducer.
//!
//! Every change to the session goes through [`reduce`], which takes the
//! current [`AppState`] and one [`AppEvent`] and returns the next state plus
//! the side effects the host must perform (saving the session document,
//! persisting preferences, starting or stopping sensors). The reducer itself
//! performs no I/O.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::honing::{HoningReadout, heading_from_azimuth, hone};
use crate::schema::{CloudSession, WirePayload, to_wire_payload};
use crate::schedule::shift_expected_times;
use crate::{GpsPoint, Waypoint};

const GUEST_USER: &str = "Guest";
const AUTH_FAILED: &str = "Authentication failed.";

/// UI toggles persisted on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub show_map_buttons: bool,
    pub show_honing_buttons: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_map_buttons: true,
            show_honing_buttons: true,
        }
    }
}

/// Snapshot of the whole app session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub is_authed: bool,
    pub online: bool,
    pub online_user: String,
    /// Last user-visible error, empty when none
    pub error_message: String,
    pub sessions: Vec<CloudSession>,
    pub selected_session_id: String,
    pub waypoints: Vec<Waypoint>,
    pub location: Option<GpsPoint>,
    /// Device heading in degrees [0, 360)
    pub heading: Option<f64>,
    pub preferences: Preferences,
}

impl AppState {
    /// Display name of the selected session, or "Loaded file" when unknown.
    pub fn selected_session_name(&self) -> &str {
        self.sessions
            .iter()
            .find(|s| s.id == self.selected_session_id)
            .map(|s| s.name.as_str())
            .unwrap_or("Loaded file")
    }

    /// Honing readout for the waypoint at `index`.
    pub fn honing(&self, index: usize) -> Option<HoningReadout> {
        hone(self.location, self.waypoints.get(index)?, self.heading)
    }
}

/// Something that happened: a user action or a collaborator callback.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SignedIn { user_name: String },
    SignInFailed { message: String },
    SignedOut,
    SessionsListed(Vec<CloudSession>),
    SessionSelected(String),
    SessionLoaded { id: String, waypoints: Vec<Waypoint> },
    RemoteError { message: String },
    ObservationRecorded { index: usize, time: String, missed: bool },
    LocationUpdated(Option<GpsPoint>),
    /// Raw azimuth in degrees, any range
    HeadingUpdated(Option<f64>),
    PreferencesLoaded(Preferences),
    ShowMapButtonsChanged(bool),
    ShowHoningButtonsChanged(bool),
}

/// Work the host must carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Merge-write the payload into the session document
    SaveSession { session_id: String, payload: WirePayload },
    PersistPreferences(Preferences),
    /// Start location and heading updates
    StartSensors,
    StopHeading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn quiet(state: AppState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Apply one event to a snapshot.
pub fn reduce(state: &AppState, event: AppEvent) -> Transition {
    let mut next = state.clone();
    match event {
        AppEvent::SignedIn { user_name } => {
            let trimmed = user_name.trim();
            next.is_authed = true;
            next.online = true;
            next.online_user = if trimmed.is_empty() {
                GUEST_USER.to_string()
            } else {
                trimmed.to_string()
            };
            next.error_message.clear();
            info!("[State] Signed in as {}", next.online_user);
            Transition::quiet(next)
        }
        AppEvent::SignInFailed { message } => {
            next.online = false;
            next.error_message = if message.trim().is_empty() {
                AUTH_FAILED.to_string()
            } else {
                message
            };
            Transition::quiet(next)
        }
        AppEvent::SignedOut => {
            info!("[State] Signed out");
            Transition::quiet(AppState {
                location: state.location,
                heading: state.heading,
                preferences: state.preferences,
                ..AppState::default()
            })
        }
        AppEvent::SessionsListed(sessions) => {
            next.sessions = sessions;
            if next.selected_session_id.trim().is_empty() {
                if let Some(first) = next.sessions.first() {
                    next.selected_session_id = first.id.clone();
                }
            }
            Transition::quiet(next)
        }
        AppEvent::SessionSelected(id) => {
            next.selected_session_id = id;
            Transition::quiet(next)
        }
        AppEvent::SessionLoaded { id, waypoints } => {
            debug!("[State] Session {} loaded with {} waypoints", id, waypoints.len());
            next.selected_session_id = id;
            next.waypoints = waypoints;
            Transition::quiet(next)
        }
        AppEvent::RemoteError { message } => {
            next.error_message = message;
            Transition::quiet(next)
        }
        AppEvent::ObservationRecorded { index, time, missed } => {
            next.waypoints = shift_expected_times(&state.waypoints, index, &time, missed);
            let mut effects = Vec::new();
            if next.is_authed && !next.selected_session_id.trim().is_empty() {
                effects.push(Effect::SaveSession {
                    session_id: next.selected_session_id.clone(),
                    payload: to_wire_payload(&next.waypoints),
                });
            }
            Transition {
                state: next,
                effects,
            }
        }
        AppEvent::LocationUpdated(location) => {
            next.location = location;
            Transition::quiet(next)
        }
        AppEvent::HeadingUpdated(azimuth) => {
            next.heading = azimuth.filter(|a| a.is_finite()).map(heading_from_azimuth);
            Transition::quiet(next)
        }
        AppEvent::PreferencesLoaded(preferences) => {
            next.preferences = preferences;
            let effects = if preferences.show_honing_buttons {
                vec![Effect::StartSensors]
            } else {
                Vec::new()
            };
            Transition {
                state: next,
                effects,
            }
        }
        AppEvent::ShowMapButtonsChanged(enabled) => {
            next.preferences.show_map_buttons = enabled;
            Transition {
                effects: vec![Effect::PersistPreferences(next.preferences)],
                state: next,
            }
        }
        AppEvent::ShowHoningButtonsChanged(enabled) => {
            next.preferences.show_honing_buttons = enabled;
            let sensors = if enabled {
                Effect::StartSensors
            } else {
                Effect::StopHeading
            };
            Transition {
                effects: vec![Effect::PersistPreferences(next.preferences), sensors],
                state: next,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in_with_session() -> AppState {
        let state = reduce(
            &AppState::default(),
            AppEvent::SignedIn {
                user_name: "  ".to_string(),
            },
        )
        .state;
        reduce(
            &state,
            AppEvent::SessionLoaded {
                id: "s1".to_string(),
                waypoints: vec![Waypoint::new("A", "08:00"), Waypoint::new("B", "08:30")],
            },
        )
        .state
    }

    #[test]
    fn test_sign_in_defaults_to_guest() {
        let state = signed_in_with_session();
        assert!(state.is_authed);
        assert!(state.online);
        assert_eq!(state.online_user, "Guest");
    }

    #[test]
    fn test_sign_in_failure_message() {
        let t = reduce(
            &AppState::default(),
            AppEvent::SignInFailed {
                message: String::new(),
            },
        );
        assert!(!t.state.online);
        assert_eq!(t.state.error_message, "Authentication failed.");
    }

    #[test]
    fn test_observation_emits_save() {
        let t = reduce(
            &signed_in_with_session(),
            AppEvent::ObservationRecorded {
                index: 0,
                time: "08:05".to_string(),
                missed: false,
            },
        );
        assert_eq!(t.state.waypoints[1].expected_time, "08:35:00");
        match &t.effects[..] {
            [Effect::SaveSession { session_id, payload }] => {
                assert_eq!(session_id, "s1");
                assert_eq!(payload.state.pts[0].time, "08:05");
                assert_eq!(payload.state.pts[1].expectedtime, "08:35:00");
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_observation_without_auth_does_not_save() {
        let state = AppState {
            selected_session_id: "s1".to_string(),
            waypoints: vec![Waypoint::new("A", "08:00")],
            ..AppState::default()
        };
        let t = reduce(
            &state,
            AppEvent::ObservationRecorded {
                index: 0,
                time: "08:05".to_string(),
                missed: false,
            },
        );
        assert!(t.effects.is_empty());
        assert_eq!(t.state.waypoints[0].actual_time, "08:05");
    }

    #[test]
    fn test_remote_error_keeps_waypoints() {
        let before = signed_in_with_session();
        let t = reduce(
            &before,
            AppEvent::RemoteError {
                message: "Unable to save session.".to_string(),
            },
        );
        assert_eq!(t.state.waypoints, before.waypoints);
        assert_eq!(t.state.error_message, "Unable to save session.");
    }

    #[test]
    fn test_sign_out_resets_session_but_keeps_preferences() {
        let mut state = signed_in_with_session();
        state.preferences.show_map_buttons = false;
        let t = reduce(&state, AppEvent::SignedOut);
        assert!(!t.state.is_authed);
        assert!(t.state.waypoints.is_empty());
        assert!(t.state.selected_session_id.is_empty());
        assert!(!t.state.preferences.show_map_buttons);
    }

    #[test]
    fn test_sessions_listed_selects_first_when_unselected() {
        let sessions = vec![
            CloudSession { id: "a".into(), name: "Alpha".into() },
            CloudSession { id: "b".into(), name: "Beta".into() },
        ];
        let t = reduce(&AppState::default(), AppEvent::SessionsListed(sessions.clone()));
        assert_eq!(t.state.selected_session_id, "a");
        assert_eq!(t.state.selected_session_name(), "Alpha");

        let chosen = reduce(&t.state, AppEvent::SessionSelected("b".into())).state;
        let relisted = reduce(&chosen, AppEvent::SessionsListed(sessions)).state;
        assert_eq!(relisted.selected_session_id, "b");
    }

    #[test]
    fn test_preference_toggles_emit_effects() {
        let t = reduce(&AppState::default(), AppEvent::ShowHoningButtonsChanged(false));
        assert!(!t.state.preferences.show_honing_buttons);
        assert_eq!(
            t.effects,
            vec![
                Effect::PersistPreferences(t.state.preferences),
                Effect::StopHeading
            ]
        );

        let t = reduce(&t.state, AppEvent::ShowMapButtonsChanged(false));
        assert_eq!(
            t.effects,
            vec![Effect::PersistPreferences(Preferences {
                show_map_buttons: false,
                show_honing_buttons: false,
            })]
        );
    }

    #[test]
    fn test_heading_is_normalized() {
        let t = reduce(&AppState::default(), AppEvent::HeadingUpdated(Some(-90.0)));
        assert_eq!(t.state.heading, Some(270.0));
        let t = reduce(&t.state, AppEvent::HeadingUpdated(Some(f64::NAN)));
        assert_eq!(t.state.heading, None);
    }

    #[test]
    fn test_honing_from_state() {
        let mut state = AppState::default();
        state.waypoints = vec![Waypoint::new("T", "").at(0.0, 0.01)];
        assert!(state.honing(0).is_none());
        state = reduce(&state, AppEvent::LocationUpdated(Some(GpsPoint::new(0.0, 0.0)))).state;
        let readout = state.honing(0).unwrap();
        assert!((readout.bearing - 90.0).abs() < 0.01);
        assert!(state.honing(5).is_none());
    }
}
