//! Building footprint lookup against the Overpass API.

pub mod client;
pub mod locator;

pub use client::{BuildingWay, OverpassClient};
pub use locator::{BuildingLocator, DEFAULT_SEARCH_RADIUS_DEG, METERS_PER_DEGREE};

use std::future::Future;

use crate::error::LocateError;
use crate::models::BuildingFootprint;

/// Seam between the cache and the footprint data source.
pub trait LocateFootprint: Send + Sync {
    fn locate(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<BuildingFootprint, LocateError>> + Send;
}

impl<L: LocateFootprint> LocateFootprint for std::sync::Arc<L> {
    fn locate(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<BuildingFootprint, LocateError>> + Send {
        (**self).locate(lat, lon)
    }
}
