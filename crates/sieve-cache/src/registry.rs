//! One entity cache per Wikibase namespace

use crate::cache::{CacheSettings, EntityCache};
use sieve_fetch::{EntityFetcher, WikibaseConfig, WikibaseFetcher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Hands out a shared `EntityCache` per entity prefix.
///
/// Build one at startup and pass it to whatever needs entity lookups; every
/// request for the same prefix gets the same cache and therefore the same
/// in-flight loads. Caches are created on first request.
#[derive(Default)]
pub struct CacheRegistry {
    settings: CacheSettings,
    caches: Mutex<HashMap<String, Arc<EntityCache>>>,
}

impl CacheRegistry {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Cache for `entity_prefix`, building its fetcher with `make_fetcher` if
    /// this is the first request for that prefix
    pub fn get_or_create<F>(&self, entity_prefix: &str, make_fetcher: F) -> Arc<EntityCache>
    where
        F: FnOnce() -> Box<dyn EntityFetcher>,
    {
        let mut caches = self.caches.lock().unwrap_or_else(|e| e.into_inner());
        let cache = caches.entry(entity_prefix.to_string()).or_insert_with(|| {
            let fetcher = make_fetcher();
            tracing::debug!(
                prefix = entity_prefix,
                fetcher = fetcher.name(),
                max_entries = self.settings.max_entries,
                "Creating entity cache"
            );
            Arc::new(EntityCache::new(fetcher, self.settings))
        });
        Arc::clone(cache)
    }

    /// Cache backed by the Wikibase API described in `config`
    pub fn for_wikibase(&self, config: &WikibaseConfig) -> Arc<EntityCache> {
        self.get_or_create(&config.entity_prefix, || {
            Box::new(WikibaseFetcher::from_config(config))
        })
    }

    /// Existing cache for a prefix, without creating one
    pub fn get(&self, entity_prefix: &str) -> Option<Arc<EntityCache>> {
        self.caches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(entity_prefix)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.caches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
