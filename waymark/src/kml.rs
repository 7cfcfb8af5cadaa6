//! KML 2.2 document generation.
//!
//! One `Placemark` per waypoint with coordinates, plus a `LookAt` camera hint
//! on the first of them. Coordinates are written `lng,lat,0` with six
//! decimals regardless of locale.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, WaymarkError};
use crate::{GpsPoint, Waypoint};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Configuration for KML generation.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlConfig {
    /// Camera distance for the `LookAt` hint in meters (default: 1000)
    pub look_at_range: f64,
    /// Emit `<open>1</open>` so viewers expand the document (default: true)
    pub open: bool,
}

impl Default for KmlConfig {
    fn default() -> Self {
        Self {
            look_at_range: 1000.0,
            open: true,
        }
    }
}

/// Format a coordinate component with exactly six decimals.
pub fn format_coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

/// `lng,lat,0` text for a `Point/coordinates` element.
pub fn coordinates_text(point: &GpsPoint) -> String {
    format!(
        "{},{},0",
        format_coordinate(point.longitude),
        format_coordinate(point.latitude)
    )
}

/// Build the KML document for a route.
///
/// Waypoints without both coordinates are skipped. The document is named
/// after `project_name`, which may be empty.
///
/// # Example
/// ```
/// use waymark::{KmlConfig, Waypoint, build_kml};
///
/// let route = vec![Waypoint::new("A&B", "08:00").at(37.123456, -122.654321)];
/// let kml = build_kml(&route, "Survey", &KmlConfig::default()).unwrap();
/// assert!(kml.contains("<coordinates>-122.654321,37.123456,0</coordinates>"));
/// assert!(kml.contains("<name>A&amp;B</name>"));
/// ```
pub fn build_kml(waypoints: &[Waypoint], project_name: &str, config: &KmlConfig) -> Result<String> {
    let placemarks: Vec<(&str, GpsPoint)> = waypoints
        .iter()
        .filter_map(|w| w.position().map(|p| (w.name.as_str(), p)))
        .collect();

    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut kml = BytesStart::new("kml");
    kml.push_attribute(("xmlns", KML_NAMESPACE));
    w.write_event(Event::Start(kml))?;
    w.write_event(Event::Start(BytesStart::new("Document")))?;

    write_text_element(&mut w, "name", project_name)?;
    if config.open {
        write_text_element(&mut w, "open", "1")?;
    }

    if let Some((_, first)) = placemarks.first() {
        w.write_event(Event::Start(BytesStart::new("LookAt")))?;
        write_text_element(&mut w, "longitude", &format_coordinate(first.longitude))?;
        write_text_element(&mut w, "latitude", &format_coordinate(first.latitude))?;
        write_text_element(&mut w, "range", &format!("{}", config.look_at_range))?;
        w.write_event(Event::End(BytesEnd::new("LookAt")))?;
    }

    for (name, point) in &placemarks {
        w.write_event(Event::Start(BytesStart::new("Placemark")))?;
        write_text_element(&mut w, "name", name)?;
        w.write_event(Event::Start(BytesStart::new("Point")))?;
        write_text_element(&mut w, "coordinates", &coordinates_text(point))?;
        w.write_event(Event::End(BytesEnd::new("Point")))?;
        w.write_event(Event::End(BytesEnd::new("Placemark")))?;
    }

    w.write_event(Event::End(BytesEnd::new("Document")))?;
    w.write_event(Event::End(BytesEnd::new("kml")))?;

    String::from_utf8(w.into_inner()).map_err(|e| WaymarkError::Export {
        message: format!("KML is not valid UTF-8: {}", e),
    })
}

/// `<tag>text</tag>` with the text XML-escaped.
fn write_text_element(w: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(route: &[Waypoint], name: &str) -> String {
        build_kml(route, name, &KmlConfig::default()).unwrap()
    }

    #[test]
    fn test_document_header() {
        let kml = build(&[], "Survey");
        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(kml.contains("<Document><name>Survey</name><open>1</open>"));
        assert!(kml.ends_with("</Document></kml>"));
    }

    #[test]
    fn test_placemark_coordinates_and_escaping() {
        let route = vec![Waypoint::new("A&B", "08:00").at(37.123456, -122.654321)];
        let kml = build(&route, "Survey");
        assert!(kml.contains(
            "<Placemark><name>A&amp;B</name><Point><coordinates>-122.654321,37.123456,0</coordinates></Point></Placemark>"
        ));
    }

    #[test]
    fn test_escapes_markup_characters() {
        let route = vec![
            Waypoint::new("<tag> \"q\"", "").at(1.0, 2.0),
            Waypoint::new("O'Brien & Sons", "").at(1.0, 2.0),
        ];
        let kml = build(&route, "a<b");
        assert!(kml.contains("<name>&lt;tag&gt; &quot;q&quot;</name>"));
        assert!(kml.contains("<name>O&apos;Brien &amp; Sons</name>"));
        assert!(kml.contains("<name>a&lt;b</name>"));
    }

    #[test]
    fn test_waypoints_without_coordinates_are_omitted() {
        let mut partial = Waypoint::new("Half", "08:10");
        partial.lat = Some(10.0);
        let route = vec![
            Waypoint::new("NoCoords", "08:00"),
            partial,
            Waypoint::new("Here", "08:20").at(1.5, 2.5),
        ];
        let kml = build(&route, "P");
        assert_eq!(kml.matches("<Placemark>").count(), 1);
        assert!(!kml.contains("NoCoords"));
        assert!(!kml.contains("Half"));
        assert!(kml.contains("<coordinates>2.500000,1.500000,0</coordinates>"));
    }

    #[test]
    fn test_look_at_on_first_placemark() {
        let route = vec![
            Waypoint::new("Skip", "08:00"),
            Waypoint::new("First", "08:10").at(45.5, 7.25),
            Waypoint::new("Second", "08:20").at(46.0, 8.0),
        ];
        let kml = build(&route, "P");
        assert!(kml.contains(
            "<LookAt><longitude>7.250000</longitude><latitude>45.500000</latitude><range>1000</range></LookAt>"
        ));
    }

    #[test]
    fn test_no_look_at_without_placemarks() {
        let kml = build(&[Waypoint::new("A", "08:00")], "P");
        assert!(!kml.contains("LookAt"));
        assert!(!kml.contains("Placemark"));
    }

    #[test]
    fn test_empty_project_name() {
        let kml = build(&[], "");
        assert!(kml.contains("<name></name>"));
    }

    #[test]
    fn test_custom_config() {
        let config = KmlConfig {
            look_at_range: 250.5,
            open: false,
        };
        let kml = build_kml(&[Waypoint::new("A", "").at(0.0, 0.0)], "P", &config).unwrap();
        assert!(kml.contains("<range>250.5</range>"));
        assert!(!kml.contains("<open>"));
    }
}
