//! Footprint area estimation.

pub mod area;

pub use area::{haversine_m, measure, ring_area_m2, EARTH_RADIUS_M};
