//! Core data models for the footprint resolution system.

pub mod record;

pub use record::{AreaResult, BuildingFootprint, GeoPoint, LatLon, RecordStatus, ResultRecord};
