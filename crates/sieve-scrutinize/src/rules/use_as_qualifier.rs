//! Use-as-qualifier rule
//!
//! A property may restrict which values one of its qualifiers accepts. Each
//! declaration names the qualifier property and lists the allowed items.

use crate::scrutinizer::{RuleConfig, Scrutinizer};
use crate::types::{QaWarning, Severity};
use serde_json::json;
use sieve_cache::ConstraintFetcher;
use sieve_core::{EntityId, ItemUpdate, Result, Statement, Value};

pub const RULE_TYPE: &str = "values-should-not-be-used-as-qualifier";

pub const CONSTRAINT_QID_KEY: &str = "one_of_qualifier_value_property_constraint_qid";
pub const PROPERTY_PID_KEY: &str = "property_pid";
pub const ITEM_PID_KEY: &str = "item_of_property_constraint_pid";

#[derive(Debug, Clone)]
struct QualifierIds {
    constraint_qid: EntityId,
    property_pid: EntityId,
    item_pid: EntityId,
}

/// Parameters of one one-of-qualifier-value declaration
#[derive(Debug, Clone, PartialEq)]
pub struct UseAsQualifierConstraint {
    pub allowed_qualifier: Option<EntityId>,
    pub allowed_values: Vec<Value>,
}

impl UseAsQualifierConstraint {
    fn from_statement(statement: &Statement, ids: &QualifierIds) -> Result<Self> {
        let mut allowed_qualifier = None;
        for value in statement.qualifier_values(&ids.property_pid) {
            allowed_qualifier = Some(value.as_entity()?.clone());
        }
        let allowed_values = statement
            .qualifier_values(&ids.item_pid)
            .cloned()
            .collect();

        Ok(Self {
            allowed_qualifier,
            allowed_values,
        })
    }

    pub fn allows(&self, value: &Value) -> bool {
        self.allowed_values.contains(value)
    }
}

/// Flags qualifier values outside a property's allow-list
#[derive(Debug, Default)]
pub struct UseAsQualifierScrutinizer {
    ids: Option<QualifierIds>,
}

impl UseAsQualifierScrutinizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scrutinizer for UseAsQualifierScrutinizer {
    fn rule_type(&self) -> &'static str {
        RULE_TYPE
    }

    fn prepare_dependencies(&mut self, config: &RuleConfig) -> bool {
        self.ids = match (
            config.entity_id(CONSTRAINT_QID_KEY),
            config.entity_id(PROPERTY_PID_KEY),
            config.entity_id(ITEM_PID_KEY),
        ) {
            (Some(constraint_qid), Some(property_pid), Some(item_pid)) => Some(QualifierIds {
                constraint_qid,
                property_pid,
                item_pid,
            }),
            _ => None,
        };
        self.ids.is_some()
    }

    fn scrutinize(
        &self,
        update: &ItemUpdate,
        constraints: &ConstraintFetcher,
    ) -> Result<Vec<QaWarning>> {
        let Some(ids) = &self.ids else {
            return Ok(Vec::new());
        };

        let mut warnings = Vec::new();
        for statement in &update.added_statements {
            let property = statement.property();
            for declaration in constraints.constraints_by_type(property, &ids.constraint_qid)? {
                let constraint = match UseAsQualifierConstraint::from_statement(&declaration, ids) {
                    Ok(constraint) => constraint,
                    Err(e) => {
                        tracing::warn!(
                            rule = RULE_TYPE,
                            property = %property,
                            error = %e,
                            "Skipping malformed constraint declaration"
                        );
                        continue;
                    }
                };
                let Some(qualifier) = &constraint.allowed_qualifier else {
                    continue;
                };

                for value in statement.qualifier_values(qualifier) {
                    if constraint.allows(value) {
                        continue;
                    }
                    warnings.push(
                        QaWarning::new(
                            RULE_TYPE,
                            format!("{}{}", property, qualifier),
                            Severity::Warning,
                            1,
                        )
                        .with_property("statement_entity", json!(property.as_str()))
                        .with_property("qualifier_entity", json!(qualifier.as_str()))
                        .with_property("example_entity", json!(update.item_id.as_str())),
                    );
                }
            }
        }

        Ok(warnings)
    }
}
