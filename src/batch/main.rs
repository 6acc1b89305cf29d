//! Batch footprint resolution.
//!
//! Reads an address file, resolves every record through the two-phase
//! pipeline, and writes the results as CSV.

mod reader;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plinth::cache::FootprintCache;
use plinth::config::Config;
use plinth::geocode::GeocodeClient;
use plinth::models::{RecordStatus, ResultRecord};
use plinth::overpass::{BuildingLocator, OverpassClient};
use plinth::pipeline::BatchPipeline;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "batch")]
#[command(about = "Resolve building footprint areas for a file of addresses")]
struct Args {
    /// Address file (.csv with an address column, or .txt with one per line)
    #[arg(short, long)]
    file: PathBuf,

    /// Output CSV path (defaults to areas-<timestamp>.csv)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker pool width per phase
    #[arg(long)]
    concurrency: Option<usize>,

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

    info!("Plinth batch resolver");

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(concurrency) = args.concurrency {
        config.pipeline.concurrency = concurrency;
    }
    if let Some(country) = args.country {
        config.geocoder.country = country;
    }

    let addresses = reader::read_addresses(&args.file)?;
    if addresses.is_empty() {
        anyhow::bail!("No addresses found in {}", args.file.display());
    }
    info!(
        "Loaded {} addresses from {}",
        addresses.len(),
        args.file.display()
    );

    let geocoder = GeocodeClient::new(&config.geocoder)?;
    let overpass = OverpassClient::new(&config.overpass)?;
    let locator = BuildingLocator::new(overpass, config.overpass.search_radius_deg);

    let pipeline = BatchPipeline::new(geocoder, FootprintCache::new(locator))
        .with_concurrency(config.pipeline.concurrency);

    // Create progress bar
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut progress = pipeline.progress();
    let bar = pb.clone();
    let progress_task = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            bar.set_position((*progress.borrow() * 100.0).round() as u64);
        }
    });

    let started = Utc::now();
    let records = pipeline.process(&addresses).await;
    pb.finish_and_clear();
    progress_task.abort();

    let located = records.iter().filter(|r| r.status.is_located()).count();
    let no_building = records
        .iter()
        .filter(|r| r.status == RecordStatus::BuildingNotFound)
        .count();
    let failed = records.len() - located - no_building;

    let out_path = args.out.unwrap_or_else(|| {
        PathBuf::from(format!("areas-{}.csv", started.format("%Y%m%d-%H%M%S")))
    });
    write_results(&out_path, &records)?;

    info!("Wrote {} records to {}", records.len(), out_path.display());
    info!(
        "Located {} buildings, {} without a match, {} failed",
        located, no_building, failed
    );
    info!("Distinct locations computed: {}", pipeline.cache().len());
    info!(
        "Completed in {:.1}s",
        (Utc::now() - started).num_milliseconds() as f64 / 1000.0
    );

    Ok(())
}

fn write_results(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record([
        "input_address",
        "resolved_address",
        "latitude",
        "longitude",
        "area_m2",
        "status",
    ])?;

    for record in records {
        let resolved = record
            .point
            .as_ref()
            .map(|p| p.formatted_address.clone())
            .unwrap_or_default();
        let lat = record
            .point
            .as_ref()
            .map(|p| p.lat.to_string())
            .unwrap_or_default();
        let lon = record
            .point
            .as_ref()
            .map(|p| p.lon.to_string())
            .unwrap_or_default();
        let area = record
            .area
            .as_ref()
            .map(|a| format!("{:.1}", a.area_m2))
            .unwrap_or_default();

        writer.write_record([
            record.input_address.as_str(),
            resolved.as_str(),
            lat.as_str(),
            lon.as_str(),
            area.as_str(),
            record.status_message().as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
