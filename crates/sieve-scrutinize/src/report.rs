//! Evaluation report types

use crate::types::{QaWarning, Severity};
use sieve_core::{EntityId, SieveError};
use std::collections::HashMap;

/// A scrutinizer call that failed and was skipped
#[derive(Debug, Clone)]
pub struct RuleFailure {
    pub rule_type: String,
    pub item_id: EntityId,
    pub error: SieveError,
}

/// Everything one evaluation run produced
#[derive(Debug, Default)]
pub struct WarningReport {
    /// Warnings in scrutinizer order, then update order
    pub warnings: Vec<QaWarning>,
    pub failures: Vec<RuleFailure>,
    /// Rules switched off because their configuration was incomplete
    pub disabled_rules: Vec<String>,
}

impl WarningReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any warning has error severity
    pub fn has_errors(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::Error)
    }

    /// Count warnings by severity
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    fn count(&self, severity: Severity) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == severity)
            .count()
    }

    /// Warnings merged by (rule type, aggregation key).
    ///
    /// Counts are summed; the first occurrence keeps its position, severity
    /// and properties.
    pub fn aggregated(&self) -> Vec<QaWarning> {
        let mut merged: Vec<QaWarning> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for warning in &self.warnings {
            let key = (warning.rule_type.clone(), warning.aggregation_key.clone());
            match index.get(&key) {
                Some(&i) => merged[i].count += warning.count,
                None => {
                    index.insert(key, merged.len());
                    merged.push(warning.clone());
                }
            }
        }

        merged
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let total = self.warnings.len();
        let mut summary = if total == 0 {
            "No issues found.".to_string()
        } else {
            format!(
                "{} issue(s): {} error(s), {} warning(s), {} info",
                total,
                self.error_count(),
                self.warning_count(),
                self.info_count(),
            )
        };

        if !self.failures.is_empty() {
            summary.push_str(&format!(" ({} check(s) failed)", self.failures.len()));
        }
        summary
    }
}
