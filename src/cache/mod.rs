//! Memoizing cache over footprint lookups.
//!
//! Keyed by coordinates rounded to 6 decimals (~0.1 m), so repeated and
//! concurrent lookups for the same location hit the providers at most once
//! per run. Entries never expire within a run.

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::LocateError;
use crate::footprint;
use crate::models::AreaResult;
use crate::overpass::LocateFootprint;

/// Cache key: micro-degree rounded coordinates.
pub type CacheKey = (i64, i64);

pub fn cache_key(lat: f64, lon: f64) -> CacheKey {
    ((lat * 1e6).round() as i64, (lon * 1e6).round() as i64)
}

/// Outcome of a locate+estimate computation. `NotFound` is cached like a
/// success: asking again within the run will not find a building either.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(AreaResult),
    NotFound,
}

/// Single-flight memoization of locate+estimate results.
///
/// Each key gets its own cell: concurrent callers for the same uncached key
/// collapse into one computation while lookups for other keys proceed
/// independently. Service and payload errors propagate to the caller and
/// leave the cell empty.
pub struct FootprintCache<L> {
    locator: L,
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<LookupOutcome>>>>,
}

impl<L: LocateFootprint> FootprintCache<L> {
    pub fn new(locator: L) -> Self {
        Self {
            locator,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached outcome for the point, computing it on first use.
    pub async fn get_or_compute(&self, lat: f64, lon: f64) -> Result<LookupOutcome, LocateError> {
        let key = cache_key(lat, lon);

        let cell = {
            let mut entries = self.entries.lock().unwrap();
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = cell
            .get_or_try_init(|| async {
                debug!("Computing footprint for key {:?}", key);
                match self.locator.locate(lat, lon).await {
                    Ok(way) => Ok(LookupOutcome::Found(footprint::measure(way))),
                    Err(LocateError::NotFound) => Ok(LookupOutcome::NotFound),
                    Err(e) => Err(e),
                }
            })
            .await?;

        Ok(outcome.clone())
    }

    /// Number of keys with a settled outcome.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildingFootprint, LatLon};
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Mode {
        Found,
        NotFound,
        FailOnce(AtomicUsize),
    }

    struct ProbeLocator {
        calls: AtomicUsize,
        mode: Mode,
    }

    impl ProbeLocator {
        fn new(mode: Mode) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                mode,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn sample_footprint() -> BuildingFootprint {
        BuildingFootprint {
            vertices: vec![
                LatLon { lat: 45.0, lon: 9.0 },
                LatLon { lat: 45.001, lon: 9.001 },
                LatLon { lat: 45.0, lon: 9.001 },
                LatLon { lat: 45.0, lon: 9.0 },
            ],
            source_id: "way/1".to_string(),
            name: "Edificio".to_string(),
            building_type: None,
        }
    }

    impl LocateFootprint for ProbeLocator {
        fn locate(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> impl Future<Output = Result<BuildingFootprint, LocateError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async {
                // Let concurrent callers pile up on the cell
                tokio::time::sleep(Duration::from_millis(5)).await;
                match &self.mode {
                    Mode::Found => Ok(sample_footprint()),
                    Mode::NotFound => Err(LocateError::NotFound),
                    Mode::FailOnce(failures) => {
                        if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(LocateError::Service("connection reset".to_string()))
                        } else {
                            Ok(sample_footprint())
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_cache_key_rounds_to_six_decimals() {
        assert_eq!(cache_key(45.0000004, 9.0000001), cache_key(45.0, 9.0));
        assert_ne!(cache_key(45.000001, 9.0), cache_key(45.0, 9.0));
        assert_eq!(cache_key(45.0000006, 9.0), cache_key(45.000001, 9.0));
    }

    #[tokio::test]
    async fn test_concurrent_same_key_computes_once() {
        let cache = FootprintCache::new(ProbeLocator::new(Mode::Found));

        let lookups = (0..8).map(|_| cache.get_or_compute(45.0000001, 9.0000004));
        let results = futures::future::join_all(lookups).await;

        assert_eq!(cache.locator.calls(), 1);
        for result in results {
            assert!(matches!(result.unwrap(), LookupOutcome::Found(_)));
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_compute_independently() {
        let cache = FootprintCache::new(ProbeLocator::new(Mode::Found));

        let (a, b) = tokio::join!(
            cache.get_or_compute(45.0, 9.0),
            cache.get_or_compute(46.0, 9.0)
        );

        a.unwrap();
        b.unwrap();
        assert_eq!(cache.locator.calls(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_cached() {
        let cache = FootprintCache::new(ProbeLocator::new(Mode::NotFound));

        let first = cache.get_or_compute(45.0, 9.0).await.unwrap();
        let second = cache.get_or_compute(45.0, 9.0).await.unwrap();

        assert!(matches!(first, LookupOutcome::NotFound));
        assert!(matches!(second, LookupOutcome::NotFound));
        assert_eq!(cache.locator.calls(), 1);
    }

    #[tokio::test]
    async fn test_service_error_is_not_cached() {
        let cache = FootprintCache::new(ProbeLocator::new(Mode::FailOnce(AtomicUsize::new(0))));

        let first = cache.get_or_compute(45.0, 9.0).await;
        assert!(matches!(first, Err(LocateError::Service(_))));
        assert_eq!(cache.len(), 0);

        let second = cache.get_or_compute(45.0, 9.0).await.unwrap();
        assert!(matches!(second, LookupOutcome::Found(_)));
        assert_eq!(cache.locator.calls(), 2);
    }
}
