//! Wall-clock time parsing and formatting.
//!
//! Times are plain `HH:MM` or `HH:MM:SS` strings with no date or zone. All
//! arithmetic happens modulo one day.

use chrono::{NaiveTime, Timelike};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Parse `HH:MM` or `HH:MM:SS` (surrounding whitespace allowed).
///
/// Seconds stop at 59: chrono's leap second (`:60`) is rejected, and so is
/// whitespace inside the value, which chrono would otherwise skip.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
        .filter(|t| t.nanosecond() < 1_000_000_000)
}

/// Seconds since midnight for a wall-clock string, or `None` if it does not parse.
pub fn parse_time_to_seconds(value: &str) -> Option<u32> {
    parse_time(value).map(|t| t.num_seconds_from_midnight())
}

/// Format any second count as `HH:MM:SS`, wrapping into a single day in both directions.
pub fn format_time_from_seconds(total_seconds: i64) -> String {
    let normalized = total_seconds.rem_euclid(SECONDS_PER_DAY);
    let hour = normalized / 3600;
    let minute = (normalized % 3600) / 60;
    let second = normalized % 60;
    format!("{:02}:{:02}:{:02}", hour, minute, second)
}

/// Hour and minute for seeding the time picker; `(0, 0)` when unparseable.
pub fn parse_hour_minute(value: &str) -> (u32, u32) {
    parse_time(value)
        .map(|t| (t.hour(), t.minute()))
        .unwrap_or((0, 0))
}

/// `HH:MM` string produced by the time picker.
pub fn format_hour_minute(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour % 24, minute % 60)
}
