//! Constraint lookup on property documents

use crate::cache::EntityCache;
use sieve_core::{EntityId, Result, Statement, Value};
use std::sync::Arc;

/// Reads constraint declarations from cached property documents.
///
/// A constraint is declared on a property entity as a statement under the
/// property-constraint property (`P2302` on Wikidata) whose value is the
/// constraint type item; its parameters are that statement's qualifiers.
#[derive(Clone)]
pub struct ConstraintFetcher {
    cache: Arc<EntityCache>,
    property_constraint_pid: EntityId,
}

impl ConstraintFetcher {
    pub fn new(cache: Arc<EntityCache>, property_constraint_pid: impl Into<EntityId>) -> Self {
        Self {
            cache,
            property_constraint_pid: property_constraint_pid.into(),
        }
    }

    pub fn property_constraint_pid(&self) -> &EntityId {
        &self.property_constraint_pid
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Declarations of `constraint_type` on `property`, in document order.
    ///
    /// A property without such declarations yields an empty list; a property
    /// the remote does not know fails with `NotFound`.
    pub fn constraints_by_type(
        &self,
        property: &EntityId,
        constraint_type: &EntityId,
    ) -> Result<Vec<Statement>> {
        let document = self.cache.get(property)?;
        Ok(document
            .statements_for(&self.property_constraint_pid)
            .iter()
            .filter(|s| matches!(s.value(), Value::Entity(id) if id == constraint_type))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;
    use sieve_core::{EntityDocument, SieveError};
    use sieve_fetch::MemoryFetcher;

    fn fetcher_for(doc: EntityDocument) -> ConstraintFetcher {
        let cache = EntityCache::new(
            Box::new(MemoryFetcher::new().with_document(doc)),
            CacheSettings::default(),
        );
        ConstraintFetcher::new(Arc::new(cache), "P2302")
    }

    #[test]
    fn test_filters_by_constraint_type_in_order() {
        let doc = EntityDocument::new("P570")
            .with_statement(
                Statement::new("P2302", Value::entity("Q21510854"))
                    .with_qualifier("P2306", Value::entity("P569")),
            )
            .with_statement(Statement::new("P2302", Value::entity("Q21502838")))
            .with_statement(
                Statement::new("P2302", Value::entity("Q21510854"))
                    .with_qualifier("P2306", Value::entity("P571")),
            )
            .with_statement(Statement::new("P31", Value::entity("Q21510854")));
        let constraints = fetcher_for(doc);

        let found = constraints
            .constraints_by_type(&EntityId::new("P570"), &EntityId::new("Q21510854"))
            .unwrap();

        assert_eq!(found.len(), 2);
        let lower = EntityId::new("P2306");
        assert_eq!(found[0].qualifier_values(&lower).next(), Some(&Value::entity("P569")));
        assert_eq!(found[1].qualifier_values(&lower).next(), Some(&Value::entity("P571")));
    }

    #[test]
    fn test_no_declaration_is_empty_not_error() {
        let constraints = fetcher_for(EntityDocument::new("P1476"));
        let found = constraints
            .constraints_by_type(&EntityId::new("P1476"), &EntityId::new("Q21510854"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_unknown_property_is_not_found() {
        let constraints = fetcher_for(EntityDocument::new("P1476"));
        let err = constraints
            .constraints_by_type(&EntityId::new("P99999"), &EntityId::new("Q21510854"))
            .unwrap_err();
        assert_eq!(err, SieveError::NotFound("P99999".to_string()));
    }
}
