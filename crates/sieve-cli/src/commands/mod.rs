//! CLI command implementations

pub mod check;
pub mod constraints;
pub mod rules;

use anyhow::{Context as _, Result};
use sieve_cache::{CacheRegistry, CacheSettings, ConstraintFetcher};
use sieve_fetch::{EntityFetcher, MemoryFetcher, SieveConfig};
use sieve_scrutinize::RuleConfig;
use std::path::Path;

/// Resolved configuration plus the entity source every command shares
pub struct Context {
    pub config: SieveConfig,
    offline: Option<String>,
    caches: CacheRegistry,
}

impl Context {
    pub fn load(config_path: Option<&str>, offline: Option<String>) -> Result<Self> {
        let config = match config_path {
            Some(path) => SieveConfig::load_from_file(Path::new(path))
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => SieveConfig::load()?,
        };
        Ok(Self::new(config, offline))
    }

    pub fn new(config: SieveConfig, offline: Option<String>) -> Self {
        let caches = CacheRegistry::new(CacheSettings::from(&config.cache));
        Self {
            config,
            offline,
            caches,
        }
    }

    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig::from(self.config.constraints.clone())
    }

    /// Constraint lookup over the configured Wikibase, or the offline snapshot
    pub fn constraint_fetcher(&self) -> Result<ConstraintFetcher> {
        let wikibase = &self.config.wikibase;
        let cache = match &self.offline {
            Some(snapshot) => match self.caches.get(&wikibase.entity_prefix) {
                Some(cache) => cache,
                None => {
                    let fetcher = MemoryFetcher::load_from_file(snapshot)
                        .with_context(|| format!("Failed to load entity snapshot {}", snapshot))?;
                    tracing::info!(
                        snapshot = %snapshot,
                        entities = fetcher.len(),
                        "Running offline"
                    );
                    self.caches.get_or_create(&wikibase.entity_prefix, move || {
                        Box::new(fetcher) as Box<dyn EntityFetcher>
                    })
                }
            },
            None => {
                tracing::debug!(endpoint = %wikibase.api_endpoint, "Using Wikibase API");
                self.caches.for_wikibase(wikibase)
            }
        };
        Ok(ConstraintFetcher::new(cache, wikibase.property_constraint_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_offline_snapshot_is_loaded_once() {
        let dir = std::env::temp_dir().join(format!("sieve_cli_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let snapshot = dir.join("entities.json");
        std::fs::copy(
            format!("{}/../../demos/entities.json", env!("CARGO_MANIFEST_DIR")),
            &snapshot,
        )
        .unwrap();

        let context = Context::new(
            SieveConfig::default(),
            Some(snapshot.to_string_lossy().into_owned()),
        );
        let first = context.constraint_fetcher().unwrap();

        // The snapshot is gone; the second call must reuse the existing cache
        std::fs::remove_dir_all(&dir).unwrap();
        let second = context.constraint_fetcher().unwrap();

        assert!(Arc::ptr_eq(first.cache(), second.cache()));
    }
}
