//! Single-address footprint lookup.
//!
//! Resolves one address and prints the estimated footprint area of the
//! nearest building.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use plinth::config::Config;
use plinth::footprint;
use plinth::geocode::GeocodeClient;
use plinth::overpass::{BuildingLocator, OverpassClient};

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Estimate the footprint area of the building at an address")]
struct Args {
    /// Address to look up
    address: String,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Country qualifier appended to unqualified addresses
    #[arg(long)]
    country: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(country) = args.country {
        config.geocoder.country = country;
    }

    let geocoder = GeocodeClient::new(&config.geocoder)?;
    let overpass = OverpassClient::new(&config.overpass)?;
    let locator = BuildingLocator::new(overpass, config.overpass.search_radius_deg);

    info!("Resolving: {}", args.address);
    let point = geocoder
        .geocode(&args.address)
        .await
        .context("Address resolution failed")?;

    println!("Address found: {}", point.formatted_address);
    println!("Coordinates:   {:.6}, {:.6}", point.lat, point.lon);

    if point.has_street_number == Some(false) {
        warn!("No street number matched; the selected building may not be the right one");
    }

    let building = locator
        .nearest_building(point.lat, point.lon)
        .await
        .context("Footprint lookup failed")?;

    let result = footprint::measure(building);

    match &result.footprint.building_type {
        Some(kind) => println!("Building:      {} (type: {})", result.footprint.name, kind),
        None => println!("Building:      {}", result.footprint.name),
    }
    println!("Source:        {}", result.footprint.source_id);
    println!("Estimated area: {:.1} m²", result.area_m2);

    Ok(())
}
