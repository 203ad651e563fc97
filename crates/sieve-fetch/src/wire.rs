//! `wbgetentities` response parsing
//!
//! Converts the MediaWiki JSON representation of an entity into an
//! `EntityDocument`. Only claims are read; labels, descriptions and
//! sitelinks are ignored.

use serde_json::Value as Json;
use sieve_core::{
    EntityDocument, EntityId, Result, SieveError, Snak, SnakGroup, Statement, TimeValue, Value,
    PRECISION_DAY,
};

/// API error code for an id that does not exist
const NO_SUCH_ENTITY: &str = "no-such-entity";

/// Parse a full `wbgetentities` response for a single requested id
pub fn parse_entity_response(response: &Json, id: &EntityId) -> Result<EntityDocument> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("unknown");
        let info = error.get("info").and_then(|i| i.as_str()).unwrap_or("");
        if code == NO_SUCH_ENTITY {
            return Err(SieveError::NotFound(id.to_string()));
        }
        return Err(SieveError::Remote(format!("{}: {}", code, info)));
    }

    let entities = response
        .get("entities")
        .and_then(|e| e.as_object())
        .ok_or_else(|| SieveError::Parse("Response has no 'entities' object".to_string()))?;

    // Redirected ids come back keyed under the target id
    let entity = entities
        .get(id.as_str())
        .or_else(|| entities.values().next())
        .ok_or_else(|| SieveError::NotFound(id.to_string()))?;

    if entity.get("missing").is_some() {
        return Err(SieveError::NotFound(id.to_string()));
    }

    parse_entity(entity, id)
}

/// Parse one entity object. Claims that fail to parse are skipped.
pub fn parse_entity(entity: &Json, requested: &EntityId) -> Result<EntityDocument> {
    let id = entity
        .get("id")
        .and_then(|i| i.as_str())
        .map(EntityId::new)
        .unwrap_or_else(|| requested.clone());

    let mut doc = EntityDocument::new(id);

    if let Some(claims) = entity.get("claims").and_then(|c| c.as_object()) {
        for (property, statements) in claims {
            let Some(statements) = statements.as_array() else {
                continue;
            };
            for claim in statements {
                // A malformed claim is dropped whole, so a declaration is
                // never read with only some of its qualifiers
                match parse_statement(claim) {
                    Ok(Some(statement)) => doc.add_statement(statement),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        entity = %doc.id,
                        property = %property,
                        error = %e,
                        "Skipping malformed claim"
                    ),
                }
            }
        }
    }

    Ok(doc)
}

/// Parse one claim. Claims whose main snak carries no value yield `None`.
pub fn parse_statement(claim: &Json) -> Result<Option<Statement>> {
    let main = claim
        .get("mainsnak")
        .ok_or_else(|| SieveError::Parse("Claim without mainsnak".to_string()))?;

    let Some(main_snak) = parse_snak(main)? else {
        return Ok(None);
    };

    let mut statement = Statement {
        main_snak,
        qualifiers: Vec::new(),
    };

    if let Some(qualifiers) = claim.get("qualifiers").and_then(|q| q.as_object()) {
        let order: Vec<&str> = match claim.get("qualifiers-order").and_then(|o| o.as_array()) {
            Some(order) => order.iter().filter_map(|p| p.as_str()).collect(),
            None => qualifiers.keys().map(|k| k.as_str()).collect(),
        };

        for property in order {
            let Some(snaks) = qualifiers.get(property).and_then(|s| s.as_array()) else {
                continue;
            };
            let mut group = SnakGroup::new(property);
            for snak in snaks {
                if let Some(snak) = parse_snak(snak)? {
                    group.snaks.push(snak);
                }
            }
            if !group.snaks.is_empty() {
                statement.qualifiers.push(group);
            }
        }
    }

    Ok(Some(statement))
}

/// Parse a snak. `somevalue`/`novalue` snaks and unsupported datatypes yield `None`.
pub fn parse_snak(snak: &Json) -> Result<Option<Snak>> {
    let property = snak
        .get("property")
        .and_then(|p| p.as_str())
        .ok_or_else(|| SieveError::Parse("Snak without property".to_string()))?;

    if snak.get("snaktype").and_then(|t| t.as_str()) != Some("value") {
        return Ok(None);
    }

    let datavalue = snak
        .get("datavalue")
        .ok_or_else(|| SieveError::Parse(format!("Value snak on {} without datavalue", property)))?;

    Ok(parse_datavalue(datavalue)?.map(|value| Snak::new(property, value)))
}

/// Parse a typed `datavalue` object
pub fn parse_datavalue(datavalue: &Json) -> Result<Option<Value>> {
    let kind = datavalue.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let value = datavalue
        .get("value")
        .ok_or_else(|| SieveError::Parse(format!("Datavalue of type '{}' without value", kind)))?;

    let parsed = match kind {
        "wikibase-entityid" => Some(Value::Entity(parse_entity_id(value)?)),
        "time" => {
            let timestamp = str_field(value, "time")?;
            let precision = value
                .get("precision")
                .and_then(|p| p.as_u64())
                .map(|p| p as u8)
                .unwrap_or(PRECISION_DAY);
            let mut time = TimeValue::from_timestamp(timestamp, precision)?;
            if let Some(calendar) = value.get("calendarmodel").and_then(|c| c.as_str()) {
                time.calendar_model = calendar.to_string();
            }
            Some(Value::Time(time))
        }
        "quantity" => {
            let amount = str_field(value, "amount")?;
            let amount: f64 = amount
                .trim_start_matches('+')
                .parse()
                .map_err(|_| SieveError::Parse(format!("Invalid quantity amount '{}'", amount)))?;
            let unit = value
                .get("unit")
                .and_then(|u| u.as_str())
                .filter(|u| *u != "1")
                .map(|u| u.to_string());
            Some(Value::Quantity(sieve_core::QuantityValue { amount, unit }))
        }
        "string" => value.as_str().map(|s| Value::String(s.to_string())),
        "monolingualtext" => Some(Value::MonolingualText {
            text: str_field(value, "text")?.to_string(),
            language: str_field(value, "language")?.to_string(),
        }),
        "globecoordinate" => Some(Value::GlobeCoordinate {
            latitude: f64_field(value, "latitude")?,
            longitude: f64_field(value, "longitude")?,
            precision: value.get("precision").and_then(|p| p.as_f64()),
        }),
        other => {
            tracing::debug!(datatype = other, "Skipping unsupported datavalue type");
            None
        }
    };

    Ok(parsed)
}

fn parse_entity_id(value: &Json) -> Result<EntityId> {
    if let Some(id) = value.get("id").and_then(|i| i.as_str()) {
        return Ok(EntityId::new(id));
    }

    // Older dumps only carry entity-type + numeric-id
    let numeric = value
        .get("numeric-id")
        .and_then(|n| n.as_u64())
        .ok_or_else(|| SieveError::Parse("Entity reference without id".to_string()))?;
    let prefix = match value.get("entity-type").and_then(|t| t.as_str()) {
        Some("property") => "P",
        Some("lexeme") => "L",
        _ => "Q",
    };
    Ok(EntityId::new(format!("{}{}", prefix, numeric)))
}

fn str_field<'a>(value: &'a Json, field: &str) -> Result<&'a str> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SieveError::Parse(format!("Missing string field '{}'", field)))
}

fn f64_field(value: &Json, field: &str) -> Result<f64> {
    value
        .get(field)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| SieveError::Parse(format!("Missing numeric field '{}'", field)))
}
