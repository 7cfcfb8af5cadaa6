//! Geographic utilities shared by the distance engine and honing.

use geo::{Bearing, Distance, Haversine, Point};

use crate::GpsPoint;

fn to_point(p: &GpsPoint) -> Point<f64> {
    // geo expects (x, y) = (lng, lat)
    Point::new(p.longitude, p.latitude)
}

/// Great-circle distance between two GPS points in meters.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(to_point(p1), to_point(p2))
}

/// Initial great-circle bearing from `from` to `to`, in degrees [0, 360).
pub fn initial_bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    normalize_degrees(Haversine::bearing(to_point(from), to_point(to)))
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
