//! Statements, qualifiers, edits and remote entity documents

use crate::id::EntityId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (property, value) fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    pub property: EntityId,
    pub value: Value,
}

impl Snak {
    pub fn new(property: impl Into<EntityId>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// Snaks sharing one property, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakGroup {
    pub property: EntityId,
    pub snaks: Vec<Snak>,
}

impl SnakGroup {
    pub fn new(property: impl Into<EntityId>) -> Self {
        Self {
            property: property.into(),
            snaks: Vec::new(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.snaks.iter().map(|s| &s.value)
    }
}

/// A main snak plus its qualifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub main_snak: Snak,
    #[serde(default)]
    pub qualifiers: Vec<SnakGroup>,
}

impl Statement {
    pub fn new(property: impl Into<EntityId>, value: Value) -> Self {
        Self {
            main_snak: Snak::new(property, value),
            qualifiers: Vec::new(),
        }
    }

    /// Add a qualifier, appending to an existing group for the same property
    pub fn with_qualifier(mut self, property: impl Into<EntityId>, value: Value) -> Self {
        let snak = Snak::new(property, value);
        match self
            .qualifiers
            .iter_mut()
            .find(|g| g.property == snak.property)
        {
            Some(group) => group.snaks.push(snak),
            None => {
                let mut group = SnakGroup::new(snak.property.clone());
                group.snaks.push(snak);
                self.qualifiers.push(group);
            }
        }
        self
    }

    pub fn property(&self) -> &EntityId {
        &self.main_snak.property
    }

    pub fn value(&self) -> &Value {
        &self.main_snak.value
    }

    /// All qualifier values for a property, across groups, in order
    pub fn qualifier_values(&self, property: &EntityId) -> impl Iterator<Item = &Value> + '_ {
        let property = property.clone();
        self.qualifiers
            .iter()
            .filter(move |g| g.property == property)
            .flat_map(|g| g.values())
    }
}

/// The unit of evaluation: statements about to be added to one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub item_id: EntityId,
    #[serde(default)]
    pub added_statements: Vec<Statement>,
}

impl ItemUpdate {
    pub fn new(item_id: impl Into<EntityId>) -> Self {
        Self {
            item_id: item_id.into(),
            added_statements: Vec::new(),
        }
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.added_statements.push(statement);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added_statements.is_empty()
    }
}

/// Snapshot of one remote entity and the statements declared on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub id: EntityId,
    /// Statements grouped by main property, each group in document order
    #[serde(default)]
    pub statements: BTreeMap<EntityId, Vec<Statement>>,
}

impl EntityDocument {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            statements: BTreeMap::new(),
        }
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.add_statement(statement);
        self
    }

    pub fn add_statement(&mut self, statement: Statement) {
        self.statements
            .entry(statement.property().clone())
            .or_default()
            .push(statement);
    }

    /// Statements whose main property is `property`
    pub fn statements_for(&self, property: &EntityId) -> &[Statement] {
        self.statements
            .get(property)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn statement_count(&self) -> usize {
        self.statements.values().map(|s| s.len()).sum()
    }
}
