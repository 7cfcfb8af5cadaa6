//! Waymarkrs - Mobile FFI bindings for the waymark route progress core
//!
//! This crate provides:
//! - UniFFI bindings for iOS/Android
//! - SQLite persistence for device preferences
//! - A session engine holding the app state snapshot between FFI calls

use std::time::Instant;

// Re-export all public types from waymark
pub use waymark::*;

// Preference persistence with SQLite storage
pub mod migrations;
pub mod persistence;
pub use persistence::{PersistenceError, PreferenceStore};

// App session engine (global state behind the FFI)
pub mod session;
pub use session::{SESSION_ENGINE, SessionEngine, with_session_engine};

// FFI-safe mirrors of waymark types
pub mod ffi_types;

// FFI bindings for mobile platforms
pub mod ffi;

uniffi::setup_scaffolding!();

/// Helper to calculate elapsed milliseconds from an Instant
#[inline]
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Initialize logging for Android
#[cfg(target_os = "android")]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("waymarkrs"),
    );
}

/// Initialize logging for iOS
#[cfg(target_os = "ios")]
pub(crate) fn init_logging() {
    use log::LevelFilter;
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = oslog::OsLogger::new("com.markersbybas.waymarkrs")
            .level_filter(LevelFilter::Debug)
            .init();
    });
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub(crate) fn init_logging() {
    // No-op on desktop; tests install env_logger themselves
}
