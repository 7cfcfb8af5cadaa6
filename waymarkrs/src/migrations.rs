//! Schema migrations for the preferences database.
//!
//! The applied version is tracked in `PRAGMA user_version`; each step runs
//! at most once and in order.

use log::info;
use rusqlite::{Connection, Result};

/// Version the database is at after [`run_migrations`].
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Read the applied schema version.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Check if any migration is pending.
pub fn needs_migration(conn: &Connection) -> Result<bool> {
    Ok(schema_version(conn)? < CURRENT_SCHEMA_VERSION)
}

/// Bring the database up to [`CURRENT_SCHEMA_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<()> {
    if !needs_migration(conn)? {
        return Ok(());
    }
    let version = schema_version(conn)?;

    if version < 1 {
        migrate_create_preferences(conn)?;
    }

    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    info!(
        "[Migrations] Schema upgraded from {} to {}",
        version, CURRENT_SCHEMA_VERSION
    );
    Ok(())
}

/// Migration 1: key/value table for boolean UI toggles.
fn migrate_create_preferences(conn: &Connection) -> Result<()> {
    info!("Running migration: create_preferences");
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        "#,
    )
}
