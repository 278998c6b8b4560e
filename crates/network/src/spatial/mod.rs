//! Geodesic distance utilities.

pub mod haversine;

pub use haversine::{
    checked_point, distance_km, haversine_km, path_length_km, round_km, EARTH_RADIUS_KM,
};
