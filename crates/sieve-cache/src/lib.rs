//! Sieve Cache - Cached access to remote entities and their constraints
//!
//! `EntityCache` bounds the number and age of resident documents and
//! coalesces concurrent loads of the same id into one remote fetch.
//! `CacheRegistry` hands out one cache per entity namespace, and
//! `ConstraintFetcher` reads constraint declarations off property documents.

mod cache;
mod constraints;
mod registry;

pub use cache::{CacheSettings, CacheStats, EntityCache};
pub use constraints::ConstraintFetcher;
pub use registry::CacheRegistry;
