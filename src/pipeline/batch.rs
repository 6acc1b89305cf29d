//! Batch resolution over many addresses.
//!
//! Phase 1 geocodes every input address; phase 2 runs the cached
//! locate+estimate for each record that resolved. Both phases run under a
//! bounded concurrency width, failures stay inside their record, and the
//! output is reassembled by input index regardless of completion order.

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{FootprintCache, LookupOutcome};
use crate::error::{LocateError, ResolveError};
use crate::geocode::ResolveAddress;
use crate::models::{GeoPoint, RecordStatus, ResultRecord};
use crate::overpass::LocateFootprint;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Orchestrates resolution of a whole address batch.
///
/// Owns the footprint cache for the duration of a run. Progress is published
/// as a fraction on a watch channel: phase-1 completions fill the first
/// half, phase-2 completions (including records that skip the phase) the
/// second half.
pub struct BatchPipeline<R, L> {
    resolver: R,
    cache: FootprintCache<L>,
    concurrency: usize,
    progress: watch::Sender<f32>,
}

impl<R: ResolveAddress, L: LocateFootprint> BatchPipeline<R, L> {
    pub fn new(resolver: R, cache: FootprintCache<L>) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            resolver,
            cache,
            concurrency: DEFAULT_CONCURRENCY,
            progress,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Subscribe to the progress fraction (0.0 to 1.0, monotone).
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.progress.subscribe()
    }

    pub fn cache(&self) -> &FootprintCache<L> {
        &self.cache
    }

    /// Process every address and return one record per input, in input order.
    pub async fn process(&self, addresses: &[String]) -> Vec<ResultRecord> {
        let total = addresses.len();
        if total == 0 {
            self.progress.send_replace(1.0);
            return Vec::new();
        }

        debug!("Processing batch of {} addresses", total);

        let resolutions = self.resolve_phase(addresses).await;
        let outcomes = self.locate_phase(&resolutions).await;

        addresses
            .iter()
            .zip(resolutions)
            .zip(outcomes)
            .map(|((address, resolution), outcome)| build_record(address, resolution, outcome))
            .collect()
    }

    /// Phase 1: geocode all addresses under the concurrency bound.
    async fn resolve_phase(&self, addresses: &[String]) -> Vec<Result<GeoPoint, ResolveError>> {
        let total = addresses.len();
        let mut slots: Vec<Option<Result<GeoPoint, ResolveError>>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        let mut completed = 0usize;
        let mut results = stream::iter(addresses.iter().enumerate())
            .map(|(index, address)| async move {
                (index, self.resolver.resolve(address).await)
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, result)) = results.next().await {
            if let Err(ref e) = result {
                warn!("Failed to resolve '{}': {}", addresses[index], e);
            }
            slots[index] = Some(result);
            completed += 1;
            self.progress
                .send_replace(completed as f32 / (2 * total) as f32);
        }
        drop(results);

        slots
            .into_iter()
            .map(|slot| slot.expect("every phase-1 index completes once"))
            .collect()
    }

    /// Phase 2: cached locate+estimate for every resolved record. Records
    /// without coordinates flow through the pool and complete immediately,
    /// so they still count toward progress.
    async fn locate_phase(
        &self,
        resolutions: &[Result<GeoPoint, ResolveError>],
    ) -> Vec<Option<Result<LookupOutcome, LocateError>>> {
        let total = resolutions.len();
        let mut slots: Vec<Option<Option<Result<LookupOutcome, LocateError>>>> =
            Vec::with_capacity(total);
        slots.resize_with(total, || None);

        let mut completed = 0usize;
        let mut results = stream::iter(resolutions.iter().enumerate())
            .map(|(index, resolution)| async move {
                let outcome = match resolution {
                    Ok(point) => Some(self.cache.get_or_compute(point.lat, point.lon).await),
                    Err(_) => None,
                };
                (index, outcome)
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, outcome)) = results.next().await {
            if let Some(Err(ref e)) = outcome {
                warn!("Footprint lookup failed for record {}: {}", index, e);
            }
            slots[index] = Some(outcome);
            completed += 1;
            self.progress
                .send_replace(0.5 + completed as f32 / (2 * total) as f32);
        }
        drop(results);

        slots
            .into_iter()
            .map(|slot| slot.expect("every phase-2 index completes once"))
            .collect()
    }
}

fn build_record(
    address: &str,
    resolution: Result<GeoPoint, ResolveError>,
    outcome: Option<Result<LookupOutcome, LocateError>>,
) -> ResultRecord {
    let input_address = address.to_string();

    let point = match resolution {
        Ok(point) => point,
        Err(ResolveError::NotFound) => {
            return ResultRecord {
                input_address,
                point: None,
                area: None,
                status: RecordStatus::AddressNotFound,
            }
        }
        Err(ResolveError::Service(msg)) => {
            return ResultRecord {
                input_address,
                point: None,
                area: None,
                status: RecordStatus::ResolveFailed(msg),
            }
        }
    };

    let (area, status) = match outcome {
        Some(Ok(LookupOutcome::Found(area))) => (Some(area), RecordStatus::Located),
        Some(Ok(LookupOutcome::NotFound)) => (None, RecordStatus::BuildingNotFound),
        Some(Err(e)) => (None, RecordStatus::LocateFailed(e.to_string())),
        None => (
            None,
            RecordStatus::LocateFailed("lookup not performed".to_string()),
        ),
    };

    ResultRecord {
        input_address,
        point: Some(point),
        area,
        status,
    }
}
