//! Overpass API client with typed response handling.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::config::OverpassConfig;
use crate::error::LocateError;
use crate::models::LatLon;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<LatLon>,
}

/// A candidate building way extracted from an Overpass response.
#[derive(Debug, Clone)]
pub struct BuildingWay {
    pub id: i64,
    pub vertices: Vec<LatLon>,
    pub name: Option<String>,
    pub building_type: Option<String>,
}

/// Client for the Overpass interpreter endpoint.
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    query_timeout_secs: u64,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        Url::parse(&config.endpoint).context("Invalid Overpass endpoint")?;

        let client = Client::builder()
            .user_agent("plinth/0.1 (building footprint lookup)")
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            query_timeout_secs: config.timeout_secs,
        })
    }

    /// Fetch all building ways with geometry around a point.
    ///
    /// `around_m` is the search radius in meters for the `around:` clause.
    pub async fn buildings_around(
        &self,
        lat: f64,
        lon: f64,
        around_m: u32,
    ) -> Result<Vec<BuildingWay>, LocateError> {
        let query = build_query(lat, lon, around_m, self.query_timeout_secs);
        debug!("Overpass query: {}", query.replace('\n', " "));

        let response = self
            .client
            .post(&self.endpoint)
            .body(query)
            .send()
            .await
            .map_err(|e| LocateError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocateError::Service(format!(
                "Overpass request returned status {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| LocateError::Service(e.to_string()))?;

        let body: OverpassResponse = serde_json::from_str(&text)
            .map_err(|e| LocateError::Payload(e.to_string()))?;

        Ok(extract_ways(body))
    }
}

fn build_query(lat: f64, lon: f64, around_m: u32, timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{}];\nway(around:{},{},{})[building];\nout geom qt;",
        timeout_secs, around_m, lat, lon
    )
}

/// Keep way elements that carry geometry; everything else in the response
/// (nodes, count elements) is irrelevant to footprint selection.
fn extract_ways(body: OverpassResponse) -> Vec<BuildingWay> {
    body.elements
        .into_iter()
        .filter(|e| e.kind == "way" && !e.geometry.is_empty())
        .map(|mut e| BuildingWay {
            id: e.id,
            vertices: std::mem::take(&mut e.geometry),
            name: e.tags.remove("name"),
            building_type: e.tags.remove("building"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_shape() {
        let q = build_query(45.4642, 9.19, 111, 10);
        assert!(q.starts_with("[out:json][timeout:10];"));
        assert!(q.contains("way(around:111,45.4642,9.19)[building];"));
        assert!(q.ends_with("out geom qt;"));
    }

    #[test]
    fn test_extract_ways_from_response() {
        let body: OverpassResponse = serde_json::from_str(
            r#"{
                "elements": [
                    {
                        "type": "way",
                        "id": 101,
                        "tags": { "building": "yes", "name": "Palazzo" },
                        "geometry": [
                            { "lat": 45.0, "lon": 9.0 },
                            { "lat": 45.0, "lon": 9.001 },
                            { "lat": 45.001, "lon": 9.001 },
                            { "lat": 45.0, "lon": 9.0 }
                        ]
                    },
                    { "type": "node", "id": 5, "geometry": [] },
                    { "type": "way", "id": 102, "geometry": [] }
                ]
            }"#,
        )
        .unwrap();

        let ways = extract_ways(body);
        assert_eq!(ways.len(), 1);
        assert_eq!(ways[0].id, 101);
        assert_eq!(ways[0].vertices.len(), 4);
        assert_eq!(ways[0].name.as_deref(), Some("Palazzo"));
        assert_eq!(ways[0].building_type.as_deref(), Some("yes"));
    }

    #[test]
    fn test_empty_response_yields_no_ways() {
        let body: OverpassResponse = serde_json::from_str(r#"{ "elements": [] }"#).unwrap();
        assert!(extract_ways(body).is_empty());
    }

    #[test]
    fn test_untagged_way_has_no_name() {
        let body: OverpassResponse = serde_json::from_str(
            r#"{
                "elements": [{
                    "type": "way",
                    "id": 7,
                    "geometry": [
                        { "lat": 45.0, "lon": 9.0 },
                        { "lat": 45.001, "lon": 9.001 }
                    ]
                }]
            }"#,
        )
        .unwrap();

        let ways = extract_ways(body);
        assert_eq!(ways.len(), 1);
        assert!(ways[0].name.is_none());
        assert!(ways[0].building_type.is_none());
    }
}
