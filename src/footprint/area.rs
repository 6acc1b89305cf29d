//! Approximate ring area via right-triangle decomposition.
//!
//! Each edge of the closed ring contributes the area of the right triangle
//! spanned by its longitude leg and latitude leg, both measured as haversine
//! distances. This matches the upstream estimator this system reproduces: it
//! is not a spherical shoelace formula, always yields a nonnegative sum
//! regardless of winding, and can overcount concave or self-intersecting
//! rings. Kept as-is intentionally.

use crate::models::{AreaResult, BuildingFootprint, LatLon};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Estimated area in square meters of a closed vertex ring.
///
/// For each consecutive pair the longitude leg runs from the vertex to the
/// corner at (lat_i, lon_{i+1}) and the latitude leg from that corner to the
/// next vertex; the triangle areas accumulate over all edges. Rings with
/// fewer than three distinct vertices degenerate to 0.
pub fn ring_area_m2(ring: &[LatLon]) -> f64 {
    let mut area = 0.0;

    for pair in ring.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        let base = haversine_m(p.lat, p.lon, p.lat, q.lon);
        let height = haversine_m(p.lat, q.lon, q.lat, q.lon);
        area += base * height / 2.0;
    }

    area
}

/// Estimate the footprint's area and build the result message.
pub fn measure(footprint: BuildingFootprint) -> AreaResult {
    let area_m2 = ring_area_m2(&footprint.vertices);

    let message = match &footprint.building_type {
        Some(kind) => format!("area computed for {} (type: {})", footprint.name, kind),
        None => format!("area computed for {}", footprint.name),
    };

    AreaResult {
        footprint,
        area_m2,
        message,
    }
}
