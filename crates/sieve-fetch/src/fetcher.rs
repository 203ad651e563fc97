//! Entity fetcher trait

use sieve_core::{EntityDocument, EntityId, Result};

/// Source of entity documents, implemented by each backend (Wikibase, memory).
///
/// Calls block until the document is available. Implementations report an
/// unknown id as `SieveError::NotFound` and transport trouble as
/// `SieveError::Remote`.
pub trait EntityFetcher: Send + Sync {
    /// Backend name (e.g. "wikibase", "memory")
    fn name(&self) -> &str;

    /// Fetch the current document for an entity
    fn fetch(&self, id: &EntityId) -> Result<EntityDocument>;
}
