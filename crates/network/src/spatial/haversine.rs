//! Great-circle distances on a spherical Earth.
//!
//! All distances are in kilometers. The sphere radius is fixed at 6371 km so
//! results match what the rest of the network tooling publishes.

use geo::{LineString, Point};

use crate::models::types::{NetworkError, Result};

/// Mean Earth radius used for every distance in this crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Build a `Point` from decimal degrees, rejecting out-of-range values.
pub fn checked_point(latitude: f64, longitude: f64) -> Result<Point> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(NetworkError::InvalidArgument(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(NetworkError::InvalidArgument(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(Point::new(longitude, latitude))
}

/// Haversine distance between two points in kilometers
pub fn haversine_km(p1: Point, p2: Point) -> f64 {
    let (lat1, lat2) = (p1.y().to_radians(), p2.y().to_radians());
    let d_lat = (p2.y() - p1.y()).to_radians();
    let d_lon = (p2.x() - p1.x()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push near-antipodal pairs just past 1
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in kilometers between two coordinates given in decimal degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    let from = checked_point(lat1, lon1)?;
    let to = checked_point(lat2, lon2)?;
    Ok(haversine_km(from, to))
}

/// Sum of the legs of a path, in kilometers. Zero for fewer than two points.
pub fn path_length_km(points: impl IntoIterator<Item = Point>) -> f64 {
    let path: LineString = points.into_iter().collect();
    path.lines()
        .map(|leg| haversine_km(leg.start.into(), leg.end.into()))
        .sum()
}

/// Round to two decimals, the precision distances are published with.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
