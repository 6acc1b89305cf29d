//! Address resolution against the external geocoding provider.

pub mod client;

pub use client::GeocodeClient;

use std::future::Future;

use crate::error::ResolveError;
use crate::models::GeoPoint;

/// Seam between the pipeline and the geocoding provider.
pub trait ResolveAddress: Send + Sync {
    fn resolve(&self, address: &str)
        -> impl Future<Output = Result<GeoPoint, ResolveError>> + Send;
}
