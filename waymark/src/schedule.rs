//! Expected-time cascade after an observation.
//!
//! Recording an actual time at one waypoint moves every later expected time
//! by the same amount: three minutes late at checkpoint 4 means checkpoints
//! 5+ are expected three minutes later too. A miss or a blank time carries no
//! timing signal and only updates the observed waypoint itself.

use log::{debug, warn};

use crate::Waypoint;
use crate::error::{OptionExt, Result};
use crate::timefmt::{format_time_from_seconds, parse_time_to_seconds};

/// Record an observation at `index` and shift downstream expected times.
///
/// Always returns a sequence of the same length as `waypoints`. The waypoint
/// at `index` receives `actual_time` and `missed` verbatim. Waypoints after it
/// have their expected time moved by `actual - expected` (wrapping across
/// midnight) unless the observation is missed or blank, either time fails to
/// parse, or the delta is zero. Later waypoints whose own expected time does
/// not parse are left as they are.
///
/// # Example
/// ```
/// use waymark::{Waypoint, shift_expected_times};
///
/// let route = vec![Waypoint::new("A", "23:40"), Waypoint::new("B", "23:50")];
/// let shifted = shift_expected_times(&route, 0, "00:00", false);
/// assert_eq!(shifted[1].expected_time, "00:10:00");
/// ```
pub fn shift_expected_times(
    waypoints: &[Waypoint],
    index: usize,
    actual_time: &str,
    missed: bool,
) -> Vec<Waypoint> {
    let mut updated = waypoints.to_vec();

    let target = match updated.get_mut(index).ok_or_index(index, waypoints.len()) {
        Ok(target) => target,
        Err(e) => {
            warn!("[Schedule] {}, ignoring observation", e);
            return updated;
        }
    };
    target.actual_time = actual_time.to_string();
    target.missed = missed;

    if missed || actual_time.trim().is_empty() {
        return updated;
    }

    let delta = match observation_delta(&target.expected_time, actual_time) {
        Ok(delta) => delta,
        Err(e) => {
            debug!("[Schedule] {} at index {}, no shift", e, index);
            return updated;
        }
    };
    if delta == 0 {
        return updated;
    }

    debug!(
        "[Schedule] Shifting {} downstream waypoints by {}s",
        updated.len() - index - 1,
        delta
    );
    for waypoint in updated.iter_mut().skip(index + 1) {
        if let Some(expected) = parse_time_to_seconds(&waypoint.expected_time) {
            waypoint.expected_time = format_time_from_seconds(i64::from(expected) + delta);
        }
    }

    updated
}

/// `actual - expected` in seconds, both taken as times of the same day.
pub fn observation_delta(expected_time: &str, actual_time: &str) -> Result<i64> {
    let expected = parse_time_to_seconds(expected_time).ok_or_invalid_time(expected_time)?;
    let actual = parse_time_to_seconds(actual_time).ok_or_invalid_time(actual_time)?;
    Ok(i64::from(actual) - i64::from(expected))
}
