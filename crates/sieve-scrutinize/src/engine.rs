//! Constraint evaluation engine

use crate::report::{RuleFailure, WarningReport};
use crate::scrutinizer::{RuleConfig, Scrutinizer};
use rayon::prelude::*;
use sieve_cache::ConstraintFetcher;
use sieve_core::ItemUpdate;

/// Runs scrutinizers over batches of item updates
pub struct EvaluationEngine {
    constraints: ConstraintFetcher,
    config: RuleConfig,
    parallel: bool,
}

impl EvaluationEngine {
    /// Create an engine; evaluation is parallel unless switched off
    pub fn new(constraints: ConstraintFetcher, config: RuleConfig) -> Self {
        Self {
            constraints,
            config,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate every scrutinizer against every update.
    ///
    /// Each scrutinizer is prepared once; those that decline are left out of
    /// the run. A failing `(scrutinizer, update)` pair is logged and recorded
    /// in `failures` without affecting any other pair. Warnings come out
    /// grouped by scrutinizer, then in update order.
    pub fn run(
        &self,
        updates: &[ItemUpdate],
        scrutinizers: Vec<Box<dyn Scrutinizer>>,
    ) -> WarningReport {
        let mut report = WarningReport::new();

        let mut active = Vec::with_capacity(scrutinizers.len());
        for mut scrutinizer in scrutinizers {
            if scrutinizer.prepare_dependencies(&self.config) {
                active.push(scrutinizer);
            } else {
                tracing::info!(
                    rule = scrutinizer.rule_type(),
                    "Rule disabled: required configuration missing"
                );
                report.disabled_rules.push(scrutinizer.rule_type().to_string());
            }
        }

        let pairs: Vec<(usize, usize)> = (0..active.len())
            .flat_map(|s| (0..updates.len()).map(move |u| (s, u)))
            .collect();
        let evaluate =
            |&(s, u): &(usize, usize)| active[s].scrutinize(&updates[u], &self.constraints);

        // Collecting an indexed parallel iterator keeps pair order
        let outcomes: Vec<_> = if self.parallel {
            pairs.par_iter().map(evaluate).collect()
        } else {
            pairs.iter().map(evaluate).collect()
        };

        for (&(s, u), outcome) in pairs.iter().zip(outcomes) {
            match outcome {
                Ok(warnings) => report.warnings.extend(warnings),
                Err(error) => {
                    let rule_type = active[s].rule_type();
                    let item_id = &updates[u].item_id;
                    tracing::warn!(
                        rule = rule_type,
                        item = %item_id,
                        error = %error,
                        "Rule failed; skipping it for this update"
                    );
                    report.failures.push(RuleFailure {
                        rule_type: rule_type.to_string(),
                        item_id: item_id.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            updates = updates.len(),
            rules = active.len(),
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "Evaluation finished"
        );

        report
    }
}
