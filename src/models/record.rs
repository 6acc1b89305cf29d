//! Record types flowing through the resolution pipeline.

use serde::{Deserialize, Serialize};

/// A single ring vertex (degrees). Matches the shape of Overpass geometry
/// nodes so provider payloads deserialize straight into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A geocoded address: coordinates plus the provider's normalized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    /// Formatted address as returned by the geocoder
    pub formatted_address: String,
    /// Whether the geocoder matched a street-number-level component.
    /// None when the flag was not derived (e.g. records built by hand).
    pub has_street_number: Option<bool>,
}

/// A building outline selected from the footprint data source.
///
/// Invariant: `vertices` forms a closed ring (first vertex equals last);
/// the locator closes open rings before constructing this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingFootprint {
    pub vertices: Vec<LatLon>,
    /// Source identifier, e.g. "way/123456"
    pub source_id: String,
    /// Building name from provider tags, "Edificio" when untagged
    pub name: String,
    /// Value of the `building` tag, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_type: Option<String>,
}

impl BuildingFootprint {
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => first == last,
            _ => true,
        }
    }
}

/// An estimated footprint area together with the ring it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaResult {
    pub footprint: BuildingFootprint,
    /// Estimated area in square meters, always >= 0
    pub area_m2: f64,
    /// Human-readable status message
    pub message: String,
}

/// Final state of one processed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Building located, area estimated
    Located,
    /// Address resolved but no building near the point
    BuildingNotFound,
    /// Footprint lookup failed (service or payload error)
    LocateFailed(String),
    /// Geocoder had no match for the address
    AddressNotFound,
    /// Geocoding failed (service error)
    ResolveFailed(String),
}

impl RecordStatus {
    pub fn is_located(&self) -> bool {
        matches!(self, RecordStatus::Located)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Located => write!(f, "ok"),
            RecordStatus::BuildingNotFound => write!(f, "no building found at this address"),
            RecordStatus::LocateFailed(msg) => write!(f, "footprint lookup failed: {}", msg),
            RecordStatus::AddressNotFound => write!(f, "address not found"),
            RecordStatus::ResolveFailed(msg) => write!(f, "geocoding failed: {}", msg),
        }
    }
}

/// One output row per input address, produced in input order.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub input_address: String,
    pub point: Option<GeoPoint>,
    pub area: Option<AreaResult>,
    pub status: RecordStatus,
}

impl ResultRecord {
    /// Status message exposed to downstream consumers. For located records
    /// this is the estimator's message (building name and type), otherwise
    /// the failure description.
    pub fn status_message(&self) -> String {
        match (&self.status, &self.area) {
            (RecordStatus::Located, Some(area)) => area.message.clone(),
            (status, _) => status.to_string(),
        }
    }
}
