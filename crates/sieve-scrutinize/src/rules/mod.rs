//! Built-in constraint rules

pub mod difference_within_range;
pub mod use_as_qualifier;

pub use difference_within_range::{
    DifferenceWithinRangeConstraint, DifferenceWithinRangeScrutinizer,
};
pub use use_as_qualifier::{UseAsQualifierConstraint, UseAsQualifierScrutinizer};

use crate::registry::ScrutinizerFactory;
use crate::scrutinizer::Scrutinizer;

/// Every built-in rule with its constructor, in evaluation order
pub fn builtin() -> Vec<(&'static str, ScrutinizerFactory)> {
    vec![
        (
            difference_within_range::RULE_TYPE,
            new_difference_within_range as ScrutinizerFactory,
        ),
        (use_as_qualifier::RULE_TYPE, new_use_as_qualifier as ScrutinizerFactory),
    ]
}

fn new_difference_within_range() -> Box<dyn Scrutinizer> {
    Box::new(DifferenceWithinRangeScrutinizer::new())
}

fn new_use_as_qualifier() -> Box<dyn Scrutinizer> {
    Box::new(UseAsQualifierScrutinizer::new())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sieve_cache::{CacheSettings, ConstraintFetcher, EntityCache};
    use sieve_core::{EntityDocument, Statement, Value};
    use sieve_fetch::MemoryFetcher;
    use std::sync::Arc;

    pub const PROPERTY_CONSTRAINT: &str = "P2302";

    /// Constraint lookup over in-memory property documents
    pub fn constraints(fetcher: MemoryFetcher) -> ConstraintFetcher {
        let cache = EntityCache::new(Box::new(fetcher), CacheSettings::default());
        ConstraintFetcher::new(Arc::new(cache), PROPERTY_CONSTRAINT)
    }

    /// A property document declaring one constraint
    pub fn property_with(property: &str, declaration: Statement) -> EntityDocument {
        EntityDocument::new(property).with_statement(declaration)
    }

    pub fn declaration(constraint_type: &str) -> Statement {
        Statement::new(PROPERTY_CONSTRAINT, Value::entity(constraint_type))
    }
}
