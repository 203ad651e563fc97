//! Difference-within-range rule
//!
//! A property may declare that its time value must lie within a range of
//! years after the value of another property on the same item, e.g. date of
//! death at least 0 and at most 150 years after date of birth.

use crate::scrutinizer::{RuleConfig, Scrutinizer};
use crate::types::{QaWarning, Severity};
use serde_json::json;
use sieve_cache::ConstraintFetcher;
use sieve_core::{EntityId, ItemUpdate, QuantityValue, Result, Statement, TimeValue, Value};
use std::collections::BTreeMap;

pub const RULE_TYPE: &str = "difference-of-the-properties-is-not-within-the-specified-range";

pub const CONSTRAINT_QID_KEY: &str = "difference_within_range_constraint_qid";
pub const LOWER_PROPERTY_PID_KEY: &str = "difference_within_range_constraint_pid";
pub const MINIMUM_VALUE_PID_KEY: &str = "minimum_value_pid";
pub const MAXIMUM_VALUE_PID_KEY: &str = "maximum_value_pid";

#[derive(Debug, Clone)]
struct RangeIds {
    constraint_qid: EntityId,
    lower_property_pid: EntityId,
    minimum_value_pid: EntityId,
    maximum_value_pid: EntityId,
}

/// Parameters of one difference-within-range declaration
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceWithinRangeConstraint {
    pub lower_property: Option<EntityId>,
    pub min: Option<QuantityValue>,
    pub max: Option<QuantityValue>,
}

impl DifferenceWithinRangeConstraint {
    /// Read parameters from the first value of each qualifier.
    ///
    /// Fails with `TypeMismatch` if a qualifier holds the wrong kind of value.
    fn from_statement(statement: &Statement, ids: &RangeIds) -> Result<Self> {
        let lower_property = statement
            .qualifier_values(&ids.lower_property_pid)
            .next()
            .map(|v| v.as_entity().cloned())
            .transpose()?;
        let min = statement
            .qualifier_values(&ids.minimum_value_pid)
            .next()
            .map(|v| v.as_quantity().cloned())
            .transpose()?;
        let max = statement
            .qualifier_values(&ids.maximum_value_pid)
            .next()
            .map(|v| v.as_quantity().cloned())
            .transpose()?;

        Ok(Self {
            lower_property,
            min,
            max,
        })
    }
}

/// Calendar difference between two times.
///
/// `days` is computed from the month fields, so day-of-month never changes
/// the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateDifference {
    years: i64,
    months: i64,
    days: i64,
}

impl DateDifference {
    fn between(lower: &TimeValue, upper: &TimeValue) -> Self {
        let months = i64::from(upper.month) - i64::from(lower.month);
        Self {
            years: upper.year - lower.year,
            months,
            days: months,
        }
    }

    fn below(&self, min: i64) -> bool {
        self.years < min
            || (self.years == 0 && self.months < 0)
            || (self.years == 0 && self.months == 0 && self.days < 0)
    }

    fn above(&self, max: i64) -> bool {
        self.years > max
    }
}

/// Flags time values too close to or too far from a related property's value
#[derive(Debug, Default)]
pub struct DifferenceWithinRangeScrutinizer {
    ids: Option<RangeIds>,
}

impl DifferenceWithinRangeScrutinizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn warning(
        &self,
        update: &ItemUpdate,
        lower_property: &EntityId,
        property: &EntityId,
        constraint: &DifferenceWithinRangeConstraint,
    ) -> QaWarning {
        QaWarning::new(RULE_TYPE, property.as_str(), Severity::Warning, 1)
            .with_property("source_entity", json!(lower_property.as_str()))
            .with_property("target_entity", json!(property.as_str()))
            .with_property("min_value", json!(constraint.min.as_ref().map(|q| q.amount)))
            .with_property("max_value", json!(constraint.max.as_ref().map(|q| q.amount)))
            .with_property("example_entity", json!(update.item_id.as_str()))
    }
}

impl Scrutinizer for DifferenceWithinRangeScrutinizer {
    fn rule_type(&self) -> &'static str {
        RULE_TYPE
    }

    fn prepare_dependencies(&mut self, config: &RuleConfig) -> bool {
        let ids = match (
            config.entity_id(CONSTRAINT_QID_KEY),
            config.entity_id(LOWER_PROPERTY_PID_KEY),
            config.entity_id(MINIMUM_VALUE_PID_KEY),
            config.entity_id(MAXIMUM_VALUE_PID_KEY),
        ) {
            (
                Some(constraint_qid),
                Some(lower_property_pid),
                Some(minimum_value_pid),
                Some(maximum_value_pid),
            ) => RangeIds {
                constraint_qid,
                lower_property_pid,
                minimum_value_pid,
                maximum_value_pid,
            },
            _ => {
                self.ids = None;
                return false;
            }
        };
        self.ids = Some(ids);
        true
    }

    fn scrutinize(
        &self,
        update: &ItemUpdate,
        constraints: &ConstraintFetcher,
    ) -> Result<Vec<QaWarning>> {
        let Some(ids) = &self.ids else {
            return Ok(Vec::new());
        };

        // Later statements for the same property replace earlier ones
        let mut values: BTreeMap<&EntityId, &Value> = BTreeMap::new();
        for statement in &update.added_statements {
            values.insert(statement.property(), statement.value());
        }

        let mut warnings = Vec::new();
        for (&property, &upper_value) in &values {
            let declarations = constraints.constraints_by_type(property, &ids.constraint_qid)?;
            let Some(declaration) = declarations.first() else {
                continue;
            };

            let parsed = DifferenceWithinRangeConstraint::from_statement(declaration, ids);
            let constraint = match parsed {
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

            let Some(lower_property) = &constraint.lower_property else {
                continue;
            };
            let Some(&lower_value) = values.get(lower_property) else {
                continue;
            };
            let (Value::Time(lower), Value::Time(upper)) = (lower_value, upper_value) else {
                continue;
            };

            let diff = DateDifference::between(lower, upper);
            if let Some(min) = &constraint.min {
                if diff.below(min.as_integer()) {
                    warnings.push(self.warning(update, lower_property, property, &constraint));
                }
            }
            if let Some(max) = &constraint.max {
                if diff.above(max.as_integer()) {
                    warnings.push(self.warning(update, lower_property, property, &constraint));
                }
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{constraints, declaration, property_with};
    use sieve_core::{EntityDocument, SieveError};
    use sieve_fetch::MemoryFetcher;

    const CONSTRAINT: &str = "Q21510854";
    const BIRTH: &str = "P569";
    const DEATH: &str = "P570";

    fn config() -> RuleConfig {
        RuleConfig::new()
            .with(CONSTRAINT_QID_KEY, CONSTRAINT)
            .with(LOWER_PROPERTY_PID_KEY, "P2306")
            .with(MINIMUM_VALUE_PID_KEY, "P2313")
            .with(MAXIMUM_VALUE_PID_KEY, "P2312")
    }

    fn prepared() -> DifferenceWithinRangeScrutinizer {
        let mut rule = DifferenceWithinRangeScrutinizer::new();
        assert!(rule.prepare_dependencies(&config()));
        rule
    }

    /// Death date declared relative to birth date with the given bounds
    fn death_range(min: Option<f64>, max: Option<f64>) -> MemoryFetcher {
        let mut decl = declaration(CONSTRAINT).with_qualifier("P2306", Value::entity(BIRTH));
        if let Some(min) = min {
            decl = decl.with_qualifier("P2313", Value::quantity(min));
        }
        if let Some(max) = max {
            decl = decl.with_qualifier("P2312", Value::quantity(max));
        }
        MemoryFetcher::new()
            .with_document(EntityDocument::new(BIRTH))
            .with_document(property_with(DEATH, decl))
    }

    fn lifespan(birth: Value, death: Value) -> ItemUpdate {
        ItemUpdate::new("Q42")
            .with_statement(Statement::new(BIRTH, birth))
            .with_statement(Statement::new(DEATH, death))
    }

    #[test]
    fn test_below_minimum_warns_once() {
        let fetcher = constraints(death_range(Some(18.0), None));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));

        let warnings = prepared().scrutinize(&update, &fetcher).unwrap();
        assert_eq!(warnings.len(), 1);

        let w = &warnings[0];
        assert_eq!(w.rule_type, RULE_TYPE);
        assert_eq!(w.aggregation_key, DEATH);
        assert_eq!(w.severity, Severity::Warning);
        assert_eq!(w.count, 1);
        assert_eq!(w.property("source_entity"), Some(&json!(BIRTH)));
        assert_eq!(w.property("target_entity"), Some(&json!(DEATH)));
        assert_eq!(w.property("min_value"), Some(&json!(18.0)));
        assert_eq!(w.property("max_value"), Some(&serde_json::Value::Null));
        assert_eq!(w.property("example_entity"), Some(&json!("Q42")));
    }

    #[test]
    fn test_difference_equal_to_minimum_is_fine() {
        let fetcher = constraints(death_range(Some(18.0), None));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2008, 1, 1));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_above_maximum_warns_once() {
        let fetcher = constraints(death_range(Some(0.0), Some(150.0)));
        let update = lifespan(Value::date(1800, 6, 1), Value::date(2000, 6, 1));

        let warnings = prepared().scrutinize(&update, &fetcher).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].property("max_value"), Some(&json!(150.0)));
        assert_eq!(warnings[0].property("min_value"), Some(&json!(0.0)));
    }

    #[test]
    fn test_negative_month_difference_in_same_year() {
        let fetcher = constraints(death_range(Some(0.0), None));
        let update = lifespan(Value::date(2000, 5, 1), Value::date(2000, 3, 1));

        assert_eq!(prepared().scrutinize(&update, &fetcher).unwrap().len(), 1);
    }

    #[test]
    fn test_too_small_and_too_large_are_independent() {
        // An inverted range: a 7-year gap is both below 10 and above 5
        let fetcher = constraints(death_range(Some(10.0), Some(5.0)));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(1997, 1, 1));

        let warnings = prepared().scrutinize(&update, &fetcher).unwrap();
        assert_eq!(warnings.len(), 2);
        for w in &warnings {
            assert_eq!(w.aggregation_key, DEATH);
            assert_eq!(w.property("min_value"), Some(&json!(10.0)));
            assert_eq!(w.property("max_value"), Some(&json!(5.0)));
        }
    }

    #[test]
    fn test_negative_month_difference_without_minimum() {
        let fetcher = constraints(death_range(None, Some(150.0)));
        let update = lifespan(Value::date(2000, 5, 1), Value::date(2000, 3, 1));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_day_of_month_is_ignored() {
        // Death ten days before birth, same month: the day delta is taken
        // from the month fields, so nothing is flagged
        let fetcher = constraints(death_range(Some(0.0), None));
        let update = lifespan(Value::date(2000, 3, 20), Value::date(2000, 3, 10));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_lower_property_missing_from_update() {
        let fetcher = constraints(death_range(Some(18.0), None));
        let update =
            ItemUpdate::new("Q42").with_statement(Statement::new(DEATH, Value::date(2005, 1, 1)));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_non_time_values_are_not_applicable() {
        let fetcher = constraints(death_range(Some(18.0), None));
        let update = lifespan(Value::date(1990, 1, 1), Value::String("2005".to_string()));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_last_statement_for_a_property_wins() {
        let fetcher = constraints(death_range(Some(18.0), None));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1))
            .with_statement(Statement::new(DEATH, Value::date(2050, 1, 1)));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_only_first_declaration_is_used() {
        let first = declaration(CONSTRAINT)
            .with_qualifier("P2306", Value::entity(BIRTH))
            .with_qualifier("P2313", Value::quantity(0.0));
        let second = declaration(CONSTRAINT)
            .with_qualifier("P2306", Value::entity(BIRTH))
            .with_qualifier("P2313", Value::quantity(100.0));
        let fetcher = constraints(
            MemoryFetcher::new()
                .with_document(EntityDocument::new(BIRTH))
                .with_document(property_with(DEATH, first).with_statement(second)),
        );
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_qualifier_type_skips_declaration() {
        let decl = declaration(CONSTRAINT)
            .with_qualifier("P2306", Value::entity(BIRTH))
            .with_qualifier("P2313", Value::entity("Q18"));
        let fetcher = constraints(
            MemoryFetcher::new()
                .with_document(EntityDocument::new(BIRTH))
                .with_document(property_with(DEATH, decl)),
        );
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_property_without_declaration() {
        let fetcher = constraints(
            MemoryFetcher::new()
                .with_document(EntityDocument::new(BIRTH))
                .with_document(EntityDocument::new(DEATH)),
        );
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));

        assert!(prepared().scrutinize(&update, &fetcher).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_property_propagates_not_found() {
        let fetcher = constraints(MemoryFetcher::new().with_document(EntityDocument::new(BIRTH)));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));

        let err = prepared().scrutinize(&update, &fetcher).unwrap_err();
        assert_eq!(err, SieveError::NotFound(DEATH.to_string()));
    }

    #[test]
    fn test_missing_config_disables_rule() {
        let mut rule = DifferenceWithinRangeScrutinizer::new();
        let config = RuleConfig::new()
            .with(CONSTRAINT_QID_KEY, CONSTRAINT)
            .with(LOWER_PROPERTY_PID_KEY, "P2306");
        assert!(!rule.prepare_dependencies(&config));

        let fetcher = constraints(death_range(Some(18.0), None));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));
        assert!(rule.scrutinize(&update, &fetcher).unwrap().is_empty());
        assert!(fetcher.cache().is_empty());
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let fetcher = constraints(death_range(Some(18.0), Some(20.0)));
        let update = lifespan(Value::date(1990, 1, 1), Value::date(2005, 1, 1));
        let rule = prepared();

        let first = rule.scrutinize(&update, &fetcher).unwrap();
        let second = rule.scrutinize(&update, &fetcher).unwrap();
        assert_eq!(first, second);
    }
}
