//! # Session Engine
//!
//! Holds the current [`AppState`] between FFI calls and routes every change
//! through [`waymark::reduce`]. Preference effects are carried out here
//! against the [`PreferenceStore`]; the remaining effects (saving the
//! session document, sensor control) are handed back to the host.

use std::path::Path;
use std::sync::Mutex;

use log::{info, warn};
use once_cell::sync::Lazy;
use waymark::{AppEvent, AppState, Effect, ExportConfig, KmzExport, export_kmz, reduce};

use crate::persistence::{PreferenceStore, Result};

/// Owner of the app state snapshot.
pub struct SessionEngine {
    state: AppState,
    store: Option<PreferenceStore>,
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEngine {
    /// Engine without preference persistence.
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            store: None,
        }
    }

    /// Engine backed by a preference store; stored toggles are applied immediately.
    pub fn with_store(store: PreferenceStore) -> Result<(Self, Vec<Effect>)> {
        let preferences = store.load()?;
        let mut engine = Self {
            store: Some(store),
            ..Self::new()
        };
        let effects = engine.dispatch(AppEvent::PreferencesLoaded(preferences));
        Ok((engine, effects))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Apply one event. Returns the effects the host still has to perform.
    pub fn dispatch(&mut self, event: AppEvent) -> Vec<Effect> {
        let transition = reduce(&self.state, event);
        self.state = transition.state;

        let mut pending = Vec::with_capacity(transition.effects.len());
        for effect in transition.effects {
            match effect {
                Effect::PersistPreferences(preferences) => {
                    if let Some(store) = self.store.as_mut() {
                        if let Err(e) = store.save(&preferences) {
                            // The in-memory toggle still applies for this run.
                            warn!("[SessionEngine] Failed to persist preferences: {}", e);
                        }
                    }
                }
                other => pending.push(other),
            }
        }
        pending
    }

    /// Export the loaded waypoints as `<session name>.kmz` in `out_dir`.
    pub fn export_kmz(&self, out_dir: &Path) -> waymark::Result<KmzExport> {
        let name = self.state.selected_session_name();
        info!(
            "[SessionEngine] Exporting session '{}' ({} waypoints)",
            name,
            self.state.waypoints.len()
        );
        export_kmz(&self.state.waypoints, name, out_dir, &ExportConfig::default())
    }
}

// ============================================================================
// Global Singleton for FFI
// ============================================================================

/// Global session engine instance.
///
/// This singleton allows FFI calls to share one app state without passing it
/// back and forth across the FFI boundary. The mutex serializes events.
pub static SESSION_ENGINE: Lazy<Mutex<SessionEngine>> = Lazy::new(|| Mutex::new(SessionEngine::new()));

/// Get a lock on the global session engine.
pub fn with_session_engine<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut SessionEngine) -> R,
{
    let mut guard = SESSION_ENGINE.lock().ok()?;
    Some(f(&mut guard))
}
