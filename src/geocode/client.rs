//! Geocoding client for the Google Geocoding API.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::ResolveAddress;
use crate::config::GeocoderConfig;
use crate::error::ResolveError;
use crate::models::GeoPoint;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeMatch>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    geometry: MatchGeometry,
    formatted_address: String,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct MatchGeometry {
    location: MatchLocation,
}

#[derive(Debug, Deserialize)]
struct MatchLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    #[serde(default)]
    types: Vec<String>,
}

/// Resolves free-text addresses into coordinates via the geocoding provider.
///
/// Stateless: one request per call, no retries. Timeouts surface as
/// [`ResolveError::Service`].
pub struct GeocodeClient {
    client: Client,
    endpoint: String,
    api_key: String,
    country: String,
}

impl GeocodeClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        Url::parse(&config.endpoint).context("Invalid geocoder endpoint")?;

        let api_key = config
            .resolve_api_key()
            .context("Geocoder API key not configured (set GOOGLE_MAPS_API_KEY)")?;

        let client = Client::builder()
            .user_agent("plinth/0.1 (building footprint lookup)")
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            country: config.country.clone(),
        })
    }

    /// Resolve one address into a [`GeoPoint`].
    pub async fn geocode(&self, address: &str) -> Result<GeoPoint, ResolveError> {
        let query = qualify_address(address, &self.country);
        debug!("Geocoding: {}", query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", query.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ResolveError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolveError::Service(format!(
                "geocoding request returned status {}",
                response.status()
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Service(format!("unreadable response: {}", e)))?;

        parse_response(body)
    }
}

impl ResolveAddress for GeocodeClient {
    fn resolve(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<GeoPoint, ResolveError>> + Send {
        self.geocode(address)
    }
}

/// Append the country qualifier unless the address already references it.
fn qualify_address(address: &str, country: &str) -> String {
    if address.to_lowercase().contains(&country.to_lowercase()) {
        address.to_string()
    } else {
        format!("{}, {}", address, country)
    }
}

fn parse_response(body: GeocodeResponse) -> Result<GeoPoint, ResolveError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(ResolveError::NotFound),
        other => {
            let detail = body.error_message.unwrap_or_default();
            return Err(ResolveError::Service(format!("{} {}", other, detail).trim().to_string()));
        }
    }

    let best = match body.results.into_iter().next() {
        Some(m) => m,
        None => return Err(ResolveError::NotFound),
    };

    let has_street_number = best
        .address_components
        .iter()
        .any(|c| c.types.iter().any(|t| t == "street_number"));

    Ok(GeoPoint {
        lat: best.geometry.location.lat,
        lon: best.geometry.location.lng,
        formatted_address: best.formatted_address,
        has_street_number: Some(has_street_number),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_appends_country() {
        assert_eq!(
            qualify_address("Via Roma 1, Milano", "Italia"),
            "Via Roma 1, Milano, Italia"
        );
    }

    #[test]
    fn test_qualify_skips_when_country_present() {
        assert_eq!(
            qualify_address("Via Roma 1, Milano, ITALIA", "Italia"),
            "Via Roma 1, Milano, ITALIA"
        );
    }

    #[test]
    fn test_parse_successful_match() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [{
                    "formatted_address": "Via Roma 1, 20121 Milano MI, Italy",
                    "geometry": { "location": { "lat": 45.4642, "lng": 9.19 } },
                    "address_components": [
                        { "types": ["street_number"] },
                        { "types": ["route"] }
                    ]
                }]
            }"#,
        )
        .unwrap();

        let point = parse_response(body).unwrap();
        assert_eq!(point.lat, 45.4642);
        assert_eq!(point.lon, 9.19);
        assert_eq!(point.formatted_address, "Via Roma 1, 20121 Milano MI, Italy");
        assert_eq!(point.has_street_number, Some(true));
    }

    #[test]
    fn test_parse_detects_missing_street_number() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [{
                    "formatted_address": "Milano MI, Italy",
                    "geometry": { "location": { "lat": 45.46, "lng": 9.19 } },
                    "address_components": [{ "types": ["locality", "political"] }]
                }]
            }"#,
        )
        .unwrap();

        let point = parse_response(body).unwrap();
        assert_eq!(point.has_street_number, Some(false));
    }

    #[test]
    fn test_parse_zero_results_is_not_found() {
        let body: GeocodeResponse =
            serde_json::from_str(r#"{ "status": "ZERO_RESULTS", "results": [] }"#).unwrap();

        assert!(matches!(parse_response(body), Err(ResolveError::NotFound)));
    }

    #[test]
    fn test_parse_quota_error_is_service_error() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{
                "status": "OVER_QUERY_LIMIT",
                "results": [],
                "error_message": "You have exceeded your daily request quota"
            }"#,
        )
        .unwrap();

        match parse_response(body) {
            Err(ResolveError::Service(msg)) => assert!(msg.contains("OVER_QUERY_LIMIT")),
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ok_with_empty_results_is_not_found() {
        let body: GeocodeResponse =
            serde_json::from_str(r#"{ "status": "OK", "results": [] }"#).unwrap();

        assert!(matches!(parse_response(body), Err(ResolveError::NotFound)));
    }
}
