//! Entity identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item (`Q42`) or property (`P569`) in a Wikibase instance.
///
/// The id is local to a namespace; the namespace's entity prefix turns it
/// into a full IRI. Equality and hashing are by the id string alone.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Property ids start with `P`
    pub fn is_property(&self) -> bool {
        self.0.starts_with('P')
    }

    /// Full IRI of this entity under the given entity prefix
    pub fn iri(&self, entity_prefix: &str) -> String {
        format!("{}{}", entity_prefix, self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
