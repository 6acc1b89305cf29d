//! Nearest-building selection around a resolved point.

use tracing::debug;

use super::client::{BuildingWay, OverpassClient};
use super::LocateFootprint;
use crate::error::LocateError;
use crate::models::{BuildingFootprint, LatLon};

/// Equatorial meters per degree, used to convert the search radius.
pub const METERS_PER_DEGREE: f64 = 111_319.9;

/// Default search radius in degrees, roughly 100 meters.
pub const DEFAULT_SEARCH_RADIUS_DEG: f64 = 0.001;

/// Finds the building way nearest to a query point.
pub struct BuildingLocator {
    client: OverpassClient,
    radius_deg: f64,
}

impl BuildingLocator {
    pub fn new(client: OverpassClient, radius_deg: f64) -> Self {
        Self { client, radius_deg }
    }

    /// Query the footprint source around the point and pick the nearest way.
    pub async fn nearest_building(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<BuildingFootprint, LocateError> {
        let around_m = (self.radius_deg * METERS_PER_DEGREE) as u32;
        let mut ways = self.client.buildings_around(lat, lon, around_m).await?;

        debug!("Found {} candidate ways near ({}, {})", ways.len(), lat, lon);

        let index = select_nearest(&ways, lat, lon).ok_or(LocateError::NotFound)?;

        Ok(into_footprint(ways.swap_remove(index)))
    }
}

impl LocateFootprint for BuildingLocator {
    fn locate(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<BuildingFootprint, LocateError>> + Send {
        self.nearest_building(lat, lon)
    }
}

/// Index of the candidate whose vertex-mean centroid is closest to the
/// query point by squared planar distance. Ties keep the first candidate.
pub fn select_nearest(ways: &[BuildingWay], lat: f64, lon: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, way) in ways.iter().enumerate() {
        if way.vertices.is_empty() {
            continue;
        }

        let (clat, clon) = vertex_mean(&way.vertices);
        let distance = (clat - lat).powi(2) + (clon - lon).powi(2);

        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }

    best.map(|(i, _)| i)
}

/// Arithmetic mean of the vertex list as returned by the provider. The
/// duplicate closing vertex of closed ways counts toward the mean.
fn vertex_mean(vertices: &[LatLon]) -> (f64, f64) {
    let n = vertices.len() as f64;
    let lat = vertices.iter().map(|v| v.lat).sum::<f64>() / n;
    let lon = vertices.iter().map(|v| v.lon).sum::<f64>() / n;
    (lat, lon)
}

fn into_footprint(way: BuildingWay) -> BuildingFootprint {
    let mut vertices = way.vertices;

    // Close the ring if the source left it open
    if vertices.first() != vertices.last() {
        if let Some(first) = vertices.first().copied() {
            vertices.push(first);
        }
    }

    BuildingFootprint {
        vertices,
        source_id: format!("way/{}", way.id),
        name: way.name.unwrap_or_else(|| "Edificio".to_string()),
        building_type: way.building_type,
    }
}
