//! Per-city forecaster cache.

use super::CityForecaster;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Loaded forecasters keyed by city.
///
/// Lookups and invalidation go through one exclusive lock, and a miss loads
/// while holding it, so an invalidation can never be overtaken by a load of
/// the superseded model.
#[derive(Debug, Default)]
pub struct ForecasterCache {
    entries: Mutex<HashMap<String, Arc<CityForecaster>>>,
}

impl ForecasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached forecaster for `city_key`, loading it with `load` on a miss.
    ///
    /// A failed load leaves the cache unchanged.
    pub fn get_or_load<F>(&self, city_key: &str, load: F) -> Result<Arc<CityForecaster>>
    where
        F: FnOnce() -> Result<CityForecaster>,
    {
        let mut entries = self.entries.lock();
        if let Some(hit) = entries.get(city_key) {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(load()?);
        debug!(city = city_key, kind = %loaded.kind(), "cached forecaster");
        entries.insert(city_key.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop the entry for `city_key`; returns whether one was cached.
    pub fn invalidate(&self, city_key: &str) -> bool {
        let removed = self.entries.lock().remove(city_key).is_some();
        if removed {
            debug!(city = city_key, "invalidated cached forecaster");
        }
        removed
    }

    pub fn contains(&self, city_key: &str) -> bool {
        self.entries.lock().contains_key(city_key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
