//! Statement values

use crate::error::{Result, SieveError};
use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar model used when none is given (proleptic Gregorian)
pub const GREGORIAN_CALENDAR: &str = "http://www.wikidata.org/entity/Q1985727";

/// Day precision in the Wikibase time model
pub const PRECISION_DAY: u8 = 11;

/// A point in time as stored by Wikibase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeValue {
    pub year: i64,
    #[serde(default)]
    pub month: u8,
    #[serde(default)]
    pub day: u8,
    #[serde(default = "default_precision")]
    pub precision: u8,
    #[serde(default = "default_calendar")]
    pub calendar_model: String,
}

fn default_precision() -> u8 {
    PRECISION_DAY
}

fn default_calendar() -> String {
    GREGORIAN_CALENDAR.to_string()
}

impl TimeValue {
    /// A day-precision Gregorian date
    pub fn new(year: i64, month: u8, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            precision: PRECISION_DAY,
            calendar_model: default_calendar(),
        }
    }

    /// Parse a Wikibase timestamp such as `+1990-01-01T00:00:00Z`.
    ///
    /// Month and day may be `00` for year or month precision.
    pub fn from_timestamp(timestamp: &str, precision: u8) -> Result<Self> {
        let bad = || SieveError::Parse(format!("Invalid timestamp '{}'", timestamp));

        let (negative, rest) = match timestamp.as_bytes().first() {
            Some(b'+') => (false, &timestamp[1..]),
            Some(b'-') => (true, &timestamp[1..]),
            _ => (false, timestamp),
        };
        let date = rest.split('T').next().ok_or_else(bad)?;
        let mut parts = date.splitn(3, '-');

        let year: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let month: u8 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let day: u8 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        if month > 12 || day > 31 {
            return Err(bad());
        }

        Ok(Self {
            year: if negative { -year } else { year },
            month,
            day,
            precision,
            calendar_model: default_calendar(),
        })
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.year < 0 { '-' } else { '+' };
        write!(
            f,
            "{}{:04}-{:02}-{:02}",
            sign,
            self.year.abs(),
            self.month,
            self.day
        )
    }
}

/// A numeric amount with an optional unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityValue {
    pub amount: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl QuantityValue {
    pub fn new(amount: f64) -> Self {
        Self { amount, unit: None }
    }

    /// The amount truncated toward zero
    pub fn as_integer(&self) -> i64 {
        self.amount.trunc() as i64
    }
}

/// The value carried by a snak
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Entity(EntityId),
    Time(TimeValue),
    Quantity(QuantityValue),
    String(String),
    MonolingualText {
        text: String,
        language: String,
    },
    GlobeCoordinate {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        precision: Option<f64>,
    },
}

impl Value {
    /// Shorthand for an entity reference
    pub fn entity(id: impl Into<EntityId>) -> Self {
        Value::Entity(id.into())
    }

    /// Shorthand for a day-precision date
    pub fn date(year: i64, month: u8, day: u8) -> Self {
        Value::Time(TimeValue::new(year, month, day))
    }

    /// Shorthand for a unitless quantity
    pub fn quantity(amount: f64) -> Self {
        Value::Quantity(QuantityValue::new(amount))
    }

    /// Name of the variant, used in mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Entity(_) => "entity",
            Value::Time(_) => "time",
            Value::Quantity(_) => "quantity",
            Value::String(_) => "string",
            Value::MonolingualText { .. } => "monolingual_text",
            Value::GlobeCoordinate { .. } => "globe_coordinate",
        }
    }

    pub fn as_entity(&self) -> Result<&EntityId> {
        match self {
            Value::Entity(id) => Ok(id),
            other => Err(other.mismatch("entity")),
        }
    }

    pub fn as_time(&self) -> Result<&TimeValue> {
        match self {
            Value::Time(t) => Ok(t),
            other => Err(other.mismatch("time")),
        }
    }

    pub fn as_quantity(&self) -> Result<&QuantityValue> {
        match self {
            Value::Quantity(q) => Ok(q),
            other => Err(other.mismatch("quantity")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    fn mismatch(&self, expected: &str) -> SieveError {
        SieveError::TypeMismatch {
            expected: expected.to_string(),
            got: self.kind_name().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Entity(id) => write!(f, "{}", id),
            Value::Time(t) => write!(f, "{}", t),
            Value::Quantity(q) => match &q.unit {
                Some(unit) => write!(f, "{} {}", q.amount, unit),
                None => write!(f, "{}", q.amount),
            },
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::MonolingualText { text, language } => write!(f, "\"{}\"@{}", text, language),
            Value::GlobeCoordinate {
                latitude,
                longitude,
                ..
            } => write!(f, "({}, {})", latitude, longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_matches_variant() {
        let v = Value::entity("Q5");
        assert_eq!(v.as_entity().unwrap(), &EntityId::new("Q5"));

        let t = Value::date(1990, 1, 1);
        assert_eq!(t.as_time().unwrap().year, 1990);
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let v = Value::String("hello".to_string());
        let err = v.as_time().unwrap_err();
        assert_eq!(
            err,
            SieveError::TypeMismatch {
                expected: "time".to_string(),
                got: "string".to_string(),
            }
        );
        assert!(v.as_quantity().is_err());
        assert!(v.as_entity().is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let t = TimeValue::from_timestamp("+1990-01-15T00:00:00Z", 11).unwrap();
        assert_eq!((t.year, t.month, t.day), (1990, 1, 15));
        assert_eq!(t.precision, 11);
    }

    #[test]
    fn test_parse_negative_year_and_year_precision() {
        let t = TimeValue::from_timestamp("-0044-00-00T00:00:00Z", 9).unwrap();
        assert_eq!((t.year, t.month, t.day), (-44, 0, 0));
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(TimeValue::from_timestamp("yesterday", 11).is_err());
        assert!(TimeValue::from_timestamp("+2000-13-01T00:00:00Z", 11).is_err());
    }

    #[test]
    fn test_quantity_truncates_toward_zero() {
        assert_eq!(QuantityValue::new(18.9).as_integer(), 18);
        assert_eq!(QuantityValue::new(-2.5).as_integer(), -2);
    }

    #[test]
    fn test_value_json_shape() {
        let json = serde_json::to_value(Value::entity("Q5")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "entity", "value": "Q5"}));

        let parsed: Value =
            serde_json::from_str(r#"{"type": "time", "value": {"year": 2005, "month": 1, "day": 1}}"#)
                .unwrap();
        assert_eq!(parsed, Value::date(2005, 1, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::date(1990, 1, 1).to_string(), "+1990-01-01");
        assert_eq!(Value::entity("Q5").to_string(), "Q5");
    }
}
