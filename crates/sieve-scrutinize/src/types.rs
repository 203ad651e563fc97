//! Warning type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity level of a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A finding produced by a scrutinizer.
///
/// Warnings sharing `rule_type` and `aggregation_key` describe the same
/// problem and may be merged by whoever presents them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaWarning {
    pub rule_type: String,
    pub aggregation_key: String,
    pub severity: Severity,
    pub count: u32,
    /// Context for rendering, e.g. the offending property and an example item
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl QaWarning {
    /// Create a warning; a zero count is raised to one
    pub fn new(
        rule_type: impl Into<String>,
        aggregation_key: impl Into<String>,
        severity: Severity,
        count: u32,
    ) -> Self {
        Self {
            rule_type: rule_type.into(),
            aggregation_key: aggregation_key.into(),
            severity,
            count: count.max(1),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Key under which duplicates are merged
    pub fn merge_key(&self) -> (&str, &str) {
        (&self.rule_type, &self.aggregation_key)
    }
}
