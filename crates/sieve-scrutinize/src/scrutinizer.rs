//! The scrutinizer contract and its configuration

use crate::types::QaWarning;
use serde::{Deserialize, Serialize};
use sieve_cache::ConstraintFetcher;
use sieve_core::{EntityId, ItemUpdate, Result};
use std::collections::HashMap;

/// Flat rule configuration: key -> entity id string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleConfig(HashMap<String, String>);

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, id: &str) -> Self {
        self.insert(key, id);
        self
    }

    pub fn insert(&mut self, key: &str, id: &str) {
        self.0.insert(key.to_string(), id.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// The id under `key`, if present and non-empty
    pub fn entity_id(&self, key: &str) -> Option<EntityId> {
        self.get(key)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(EntityId::new)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for RuleConfig {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// A constraint rule applied to item updates.
///
/// The engine calls `prepare_dependencies` exactly once, before any
/// `scrutinize` call. A rule that returns `false` there is disabled: its
/// `scrutinize` must then return no warnings without touching the cache.
/// After preparation `scrutinize` may run concurrently from several threads.
pub trait Scrutinizer: Send + Sync {
    /// Stable tag identifying the rule in warnings and configuration
    fn rule_type(&self) -> &'static str;

    /// Resolve the entity ids this rule needs; `false` disables the rule
    fn prepare_dependencies(&mut self, config: &RuleConfig) -> bool;

    /// Check one update. Cache failures are returned, not swallowed.
    fn scrutinize(
        &self,
        update: &ItemUpdate,
        constraints: &ConstraintFetcher,
    ) -> Result<Vec<QaWarning>>;
}
