//! In-memory fetcher
//!
//! Serves documents held in process: loaded from a JSON snapshot for offline
//! runs, or built directly in tests. Counts every fetch so callers can check
//! how often the remote side would have been hit.

use crate::fetcher::EntityFetcher;
use sieve_core::{EntityDocument, EntityId, Result, SieveError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// A fetcher backed by a map of documents
#[derive(Default)]
pub struct MemoryFetcher {
    documents: RwLock<HashMap<EntityId, EntityDocument>>,
    failures: RwLock<HashMap<EntityId, SieveError>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load documents from a JSON array of `EntityDocument`s
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let documents: Vec<EntityDocument> = serde_json::from_str(&content).map_err(|e| {
            SieveError::Parse(format!(
                "Failed to parse entity snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let fetcher = Self::new();
        for doc in documents {
            fetcher.insert(doc);
        }
        Ok(fetcher)
    }

    pub fn with_document(self, document: EntityDocument) -> Self {
        self.insert(document);
        self
    }

    /// Simulate a slow remote: every fetch sleeps this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make fetches for `id` fail with `error`
    pub fn with_failure(self, id: impl Into<EntityId>, error: SieveError) -> Self {
        self.failures
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into(), error);
        self
    }

    /// Insert or replace a document
    pub fn insert(&self, document: EntityDocument) {
        self.documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(document.id.clone(), document);
    }

    /// Number of `fetch` calls served so far, successful or not
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityFetcher for MemoryFetcher {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, id: &EntityId) -> Result<EntityDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        if let Some(error) = self
            .failures
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
        {
            return Err(error.clone());
        }

        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| SieveError::NotFound(id.to_string()))
    }
}
