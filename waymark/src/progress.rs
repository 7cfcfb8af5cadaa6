//! Display rows for the marker list.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::Waypoint;
use crate::distance::route_distances;

/// Everything the marker card for one waypoint needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRow {
    pub index: usize,
    /// "Previous → Name", or just the name for the first/unnamed predecessor
    pub arrow_label: String,
    pub segment_distance: f64,
    pub cumulative_distance: f64,
    /// The segment is meaningless for the first waypoint
    pub show_segment: bool,
    pub actual_display: String,
    pub has_coordinates: bool,
}

/// Label leading into a waypoint from its predecessor.
pub fn arrow_label(previous: Option<&Waypoint>, current: &Waypoint) -> String {
    match previous.map(|p| p.name.as_str()) {
        Some(prev) if !prev.trim().is_empty() => format!("{} → {}", prev, current.name),
        _ => current.name.clone(),
    }
}

pub fn build_rows(waypoints: &[Waypoint]) -> Vec<WaypointRow> {
    let distances = route_distances(waypoints);
    waypoints
        .iter()
        .enumerate()
        .map(|(i, w)| WaypointRow {
            index: i,
            arrow_label: arrow_label(i.checked_sub(1).and_then(|p| waypoints.get(p)), w),
            segment_distance: distances.segments[i],
            cumulative_distance: distances.cumulative[i],
            show_segment: i > 0,
            actual_display: w.actual_display().to_string(),
            has_coordinates: w.has_coordinates(),
        })
        .collect()
}

/// Characters left as-is in a map label; everything else is percent-encoded.
const LABEL_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'!')
    .remove(b'.')
    .remove(b'~')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

/// `geo:` URI that opens a map app on the waypoint with its name as the pin label.
///
/// None when the waypoint has no coordinates.
pub fn geo_uri(waypoint: &Waypoint) -> Option<String> {
    let p = waypoint.position()?;
    let label = utf8_percent_encode(&waypoint.name, LABEL_KEEP);
    Some(format!(
        "geo:{:?},{:?}?q={:?},{:?}({})",
        p.latitude, p.longitude, p.latitude, p.longitude, label
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_route() {
        let mut route = vec![
            Waypoint::new("Start", "08:00").at(45.0, 7.0).with_distance(100.0),
            Waypoint::new("", "08:10").with_distance(50.0),
            Waypoint::new("End", "08:20"),
        ];
        route[2].missed = true;
        let rows = build_rows(&route);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].arrow_label, "Start");
        assert!(!rows[0].show_segment);
        assert_eq!(rows[0].cumulative_distance, 0.0);
        assert!(rows[0].has_coordinates);

        assert_eq!(rows[1].arrow_label, "Start → ");
        assert_eq!(rows[1].segment_distance, 100.0);
        assert_eq!(rows[1].cumulative_distance, 100.0);
        assert_eq!(rows[1].actual_display, "--:--");

        // Blank predecessor name: label is just the waypoint name
        assert_eq!(rows[2].arrow_label, "End");
        assert_eq!(rows[2].cumulative_distance, 150.0);
        assert_eq!(rows[2].actual_display, "Not Detected");
    }

    #[test]
    fn test_geo_uri() {
        let wp = Waypoint::new("Gate 3 & hut", "08:00").at(46.5, 8.0);
        assert_eq!(
            geo_uri(&wp).as_deref(),
            Some("geo:46.5,8.0?q=46.5,8.0(Gate%203%20%26%20hut)")
        );
        let wp = Waypoint::new("Bas' (north)", "").at(-1.25, 120.125);
        assert_eq!(
            geo_uri(&wp).as_deref(),
            Some("geo:-1.25,120.125?q=-1.25,120.125(Bas'%20(north))")
        );
        assert_eq!(geo_uri(&Waypoint::new("Nowhere", "08:00")), None);
    }

    #[test]
    fn test_empty_route() {
        assert!(build_rows(&[]).is_empty());
    }
}
