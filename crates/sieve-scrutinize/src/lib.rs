//! Sieve Scrutinize - Constraint checks over proposed edits
//!
//! Each rule is a `Scrutinizer`: it reads the ids it needs from the rule
//! configuration, then inspects item updates against the constraints
//! declared on the properties they use. The `EvaluationEngine` runs a set of
//! scrutinizers over a batch and collects their warnings.

mod engine;
mod registry;
mod report;
pub mod rules;
mod scrutinizer;
mod types;

pub use engine::EvaluationEngine;
pub use registry::{ScrutinizerFactory, ScrutinizerRegistry};
pub use report::{RuleFailure, WarningReport};
pub use scrutinizer::{RuleConfig, Scrutinizer};
pub use types::{QaWarning, Severity};
