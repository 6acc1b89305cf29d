use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::overpass::DEFAULT_SEARCH_RADIUS_DEG;
use crate::pipeline::DEFAULT_CONCURRENCY;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub overpass: OverpassConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    /// API key; falls back to the GOOGLE_MAPS_API_KEY environment variable
    pub api_key: Option<String>,
    /// Country qualifier appended to addresses that do not mention it
    pub country: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    pub endpoint: String,
    /// Search radius in degrees around the resolved point
    pub search_radius_deg: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub concurrency: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key: None,
            country: "Italia".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://overpass-api.de/api/interpreter".to_string(),
            search_radius_deg: DEFAULT_SEARCH_RADIUS_DEG,
            timeout_secs: 10,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl GeocoderConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_MAPS_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load the given file, or defaults when no path is provided.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
