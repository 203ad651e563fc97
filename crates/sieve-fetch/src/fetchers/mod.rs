//! Fetcher backends

pub mod memory;
pub mod wikibase;
