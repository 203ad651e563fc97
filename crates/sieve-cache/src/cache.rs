//! Bounded, expiring entity cache with single-flight loading

use sieve_core::{EntityDocument, EntityId, Result, SieveError};
use sieve_fetch::{CacheConfig, EntityFetcher};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

type LoadResult = Result<Arc<EntityDocument>>;

/// Size and age bounds for an `EntityCache`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_entries: usize,
    /// Entries older than this are never served, whatever their access pattern
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 4096,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            ttl: config.ttl(),
        }
    }
}

/// Hit/miss counters, readable while the cache is in use
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Loads that went to the fetcher
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Calls that waited on a load started by another caller
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

struct CacheEntry {
    document: Arc<EntityDocument>,
    inserted_at: Instant,
}

/// A load in progress; waiters block on `done` until `result` is set
struct InFlight {
    result: Mutex<Option<LoadResult>>,
    done: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, result: LoadResult) {
        let mut slot = self.result.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(result);
        self.done.notify_all();
    }

    fn wait(&self) -> LoadResult {
        let mut slot = self.result.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
    }
}

struct CacheState {
    entries: lru::LruCache<EntityId, CacheEntry>,
    in_flight: HashMap<EntityId, Arc<InFlight>>,
}

/// Caches entity documents loaded through an `EntityFetcher`.
///
/// Safe to share across threads. Concurrent `get`s for an id that is still
/// loading wait for that load instead of starting another one; failed loads
/// are handed to every waiter and are not cached.
pub struct EntityCache {
    fetcher: Box<dyn EntityFetcher>,
    ttl: Duration,
    state: Mutex<CacheState>,
    stats: CacheStats,
}

impl EntityCache {
    pub fn new(fetcher: Box<dyn EntityFetcher>, settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            ttl: settings.ttl,
            state: Mutex::new(CacheState {
                entries: lru::LruCache::new(capacity),
                in_flight: HashMap::new(),
            }),
            stats: CacheStats::default(),
        }
    }

    /// Get a document, loading it on a miss or after expiry
    pub fn get(&self, id: &EntityId) -> Result<Arc<EntityDocument>> {
        let flight = {
            let mut state = self.lock_state();

            if let Some(document) = self.fresh_entry(&mut state, id) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(entity = %id, "Cache hit");
                return Ok(document);
            }

            if let Some(flight) = state.in_flight.get(id) {
                let flight = Arc::clone(flight);
                drop(state);
                self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(entity = %id, "Waiting on in-flight load");
                return flight.wait();
            }

            let flight = Arc::new(InFlight::new());
            state.in_flight.insert(id.clone(), Arc::clone(&flight));
            flight
        };

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(entity = %id, fetcher = self.fetcher.name(), "Loading entity");

        let result = match catch_unwind(AssertUnwindSafe(|| self.fetcher.fetch(id))) {
            Ok(result) => result.map(Arc::new),
            Err(_) => Err(SieveError::Remote(format!("Loader panicked while fetching {}", id))),
        };

        {
            let mut state = self.lock_state();
            state.in_flight.remove(id);
            if let Ok(document) = &result {
                state.entries.put(
                    id.clone(),
                    CacheEntry {
                        document: Arc::clone(document),
                        inserted_at: Instant::now(),
                    },
                );
            }
        }

        if let Err(e) = &result {
            tracing::debug!(entity = %id, error = %e, "Entity load failed");
        }

        flight.complete(result.clone());
        result
    }

    /// Whether a servable (unexpired) entry is resident; does not touch recency
    pub fn contains(&self, id: &EntityId) -> bool {
        let state = self.lock_state();
        state
            .entries
            .peek(id)
            .map(|entry| entry.inserted_at.elapsed() <= self.ttl)
            .unwrap_or(false)
    }

    /// Drop one entry so the next `get` reloads it
    pub fn invalidate(&self, id: &EntityId) {
        self.lock_state().entries.pop(id);
    }

    pub fn clear(&self) {
        self.lock_state().entries.clear();
    }

    /// Resident entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn fetcher_name(&self) -> &str {
        self.fetcher.name()
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fresh_entry(&self, state: &mut CacheState, id: &EntityId) -> Option<Arc<EntityDocument>> {
        let expired = match state.entries.get(id) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                return Some(Arc::clone(&entry.document));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            tracing::debug!(entity = %id, "Cache entry expired");
            state.entries.pop(id);
        }
        None
    }
}
