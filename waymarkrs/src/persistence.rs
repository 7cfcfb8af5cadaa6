//! # Preference Store
//!
//! SQLite-backed storage for the device-local UI toggles. Missing keys read
//! back as the defaults from [`Preferences::default`].

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use waymark::Preferences;

use crate::migrations::run_migrations;

pub const PREF_SHOW_MAP: &str = "show_map_buttons";
pub const PREF_SHOW_HONING: &str = "show_honing_buttons";

/// Errors from the preferences database.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Device-local preference storage.
pub struct PreferenceStore {
    db: Connection,
    db_path: String,
}

impl PreferenceStore {
    /// Open (or create) the preferences database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        run_migrations(&db)?;
        info!("[PreferenceStore] Opened {}", db_path);
        Ok(Self {
            db,
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Read both toggles, falling back to defaults for unset keys.
    pub fn load(&self) -> Result<Preferences> {
        let defaults = Preferences::default();
        let preferences = Preferences {
            show_map_buttons: self
                .get_bool(PREF_SHOW_MAP)?
                .unwrap_or(defaults.show_map_buttons),
            show_honing_buttons: self
                .get_bool(PREF_SHOW_HONING)?
                .unwrap_or(defaults.show_honing_buttons),
        };
        debug!("[PreferenceStore] Loaded {:?}", preferences);
        Ok(preferences)
    }

    /// Write both toggles in one transaction.
    pub fn save(&mut self, preferences: &Preferences) -> Result<()> {
        let tx = self.db.transaction()?;
        for (key, value) in [
            (PREF_SHOW_MAP, preferences.show_map_buttons),
            (PREF_SHOW_HONING, preferences.show_honing_buttons),
        ] {
            tx.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        debug!("[PreferenceStore] Saved {:?}", preferences);
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self
            .db
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, bool>(0),
            )
            .optional()?)
    }
}
