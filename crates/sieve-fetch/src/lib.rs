//! Sieve Fetch - Remote entity access
//!
//! Provides the `EntityFetcher` contract used by the entity cache, a
//! Wikibase implementation speaking the MediaWiki `wbgetentities` API, an
//! in-memory implementation for offline runs and tests, and the layered
//! configuration shared by the whole tool.

pub mod config;
pub mod fetcher;
pub mod fetchers;
pub mod wire;

pub use config::{CacheConfig, EngineConfig, SieveConfig, WikibaseConfig};
pub use fetcher::EntityFetcher;
pub use fetchers::memory::MemoryFetcher;
pub use fetchers::wikibase::WikibaseFetcher;
