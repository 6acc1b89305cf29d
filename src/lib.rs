//! Plinth - building footprint area resolution
//!
//! Resolves free-text addresses into estimated footprint areas of the
//! nearest building, via an external geocoder and the Overpass API. This
//! library provides shared types and modules for the batch and lookup
//! binaries.

pub mod cache;
pub mod config;
pub mod error;
pub mod footprint;
pub mod geocode;
pub mod models;
pub mod overpass;
pub mod pipeline;

pub use error::{LocateError, ResolveError};
pub use models::{AreaResult, BuildingFootprint, GeoPoint, RecordStatus, ResultRecord};
