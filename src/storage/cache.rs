use crate::storage::error::LoadError;
use crate::storage::store::DatasetStore;
use crate::types::dataset::Dataset;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct CachedDataset {
    dataset: Arc<Dataset>,
    loaded_at: Instant,
}

/// Holds the last loaded dataset for at most `ttl`.
#[derive(Debug)]
pub struct DatasetCache {
    ttl: Duration,
    entry: Mutex<Option<CachedDataset>>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached dataset, unless it is older than the TTL.
    pub async fn get(&self) -> Option<Arc<Dataset>> {
        let entry = self.entry.lock().await;
        entry
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.dataset))
    }

    /// Replaces the cached dataset and restarts its TTL.
    pub async fn insert(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        *self.entry.lock().await = Some(CachedDataset {
            dataset: Arc::clone(&dataset),
            loaded_at: Instant::now(),
        });
        dataset
    }

    pub async fn invalidate(&self) {
        debug!("Dataset cache invalidated");
        *self.entry.lock().await = None;
    }

    /// Returns the cached dataset or loads it from `store`.
    ///
    /// The lock is not held while loading. When two callers load at the same time the
    /// dataset that reached the cache first wins.
    pub async fn get_or_load(&self, store: &DatasetStore) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.get().await {
            return Ok(dataset);
        }

        debug!("Dataset cache miss, loading from {}", store);
        let loaded = store.load().await?;

        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
        {
            return Ok(Arc::clone(&cached.dataset));
        }

        let dataset = Arc::new(loaded);
        *entry = Some(CachedDataset {
            dataset: Arc::clone(&dataset),
            loaded_at: Instant::now(),
        });
        Ok(dataset)
    }
}
