//! Scrutinizer registry: rule tag -> constructor

use crate::rules;
use crate::scrutinizer::Scrutinizer;
use sieve_core::{Result, SieveError};

/// Builds a fresh, unprepared scrutinizer
pub type ScrutinizerFactory = fn() -> Box<dyn Scrutinizer>;

/// Known rules, kept in registration order so runs are reproducible
#[derive(Default)]
pub struct ScrutinizerRegistry {
    factories: Vec<(&'static str, ScrutinizerFactory)>,
}

impl ScrutinizerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        for (rule_type, factory) in rules::builtin() {
            registry.register(rule_type, factory);
        }
        registry
    }

    /// Register a rule; a tag registered twice keeps the newer constructor
    pub fn register(&mut self, rule_type: &'static str, factory: ScrutinizerFactory) {
        if let Some(slot) = self.factories.iter_mut().find(|(t, _)| *t == rule_type) {
            slot.1 = factory;
        } else {
            self.factories.push((rule_type, factory));
        }
    }

    pub fn rule_types(&self) -> Vec<&'static str> {
        self.factories.iter().map(|(t, _)| *t).collect()
    }

    pub fn create(&self, rule_type: &str) -> Option<Box<dyn Scrutinizer>> {
        self.factories
            .iter()
            .find(|(t, _)| *t == rule_type)
            .map(|(_, factory)| factory())
    }

    /// One instance of every registered rule
    pub fn create_all(&self) -> Vec<Box<dyn Scrutinizer>> {
        self.factories.iter().map(|(_, factory)| factory()).collect()
    }

    /// Instances of the named rules, in the order given
    pub fn create_selected(&self, rule_types: &[String]) -> Result<Vec<Box<dyn Scrutinizer>>> {
        rule_types
            .iter()
            .map(|rule_type| {
                self.create(rule_type).ok_or_else(|| {
                    SieveError::Config(format!(
                        "Unknown rule '{}'. Known rules: {}",
                        rule_type,
                        self.rule_types().join(", ")
                    ))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
