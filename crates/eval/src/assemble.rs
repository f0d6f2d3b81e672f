//! Fact assembly from JSON.
//!
//! Converts an external facts document into `Facts`, and defines the
//! JSON encoding of values shared with rule set interchange:
//!
//! | JSON | Value |
//! |---|---|
//! | number | `Number` (read exactly as a decimal) |
//! | string | `Text` |
//! | bool | `Bool` |
//! | null | `Nil` |
//! | array | `List` |
//! | `{"symbol": "friday"}` | `Symbol` |
//! | `{"instant": "2015-01-01T05:00:00Z"}` | `Instant` (RFC 3339) |

use std::str::FromStr;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::context::Facts;
use crate::types::{EvalError, Value};

/// Assemble a `Facts` mapping from a JSON object.
pub fn assemble_facts(facts: &serde_json::Value) -> Result<Facts, EvalError> {
    let obj = facts
        .as_object()
        .ok_or_else(|| EvalError::deserialize("facts must be a JSON object"))?;

    let mut assembled = Facts::new();
    for (key, raw) in obj {
        let value = value_from_json(raw).map_err(|e| match e {
            EvalError::Deserialize { message } => {
                EvalError::deserialize(format!("fact '{}': {}", key, message))
            }
            other => other,
        })?;
        assembled.insert(key.clone(), value);
    }
    Ok(assembled)
}

/// Decode a value from its JSON encoding.
pub fn value_from_json(v: &serde_json::Value) -> Result<Value, EvalError> {
    match v {
        serde_json::Value::Null => Ok(Value::Nil),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => parse_number(&n.to_string()).map(Value::Number),
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(obj) => {
            if obj.len() == 1 {
                if let Some(name) = obj.get("symbol").and_then(|s| s.as_str()) {
                    return Ok(Value::Symbol(name.to_string()));
                }
                if let Some(stamp) = obj.get("instant").and_then(|s| s.as_str()) {
                    let instant = OffsetDateTime::parse(stamp, &Rfc3339)
                        .map_err(|e| EvalError::invalid_timestamp(stamp, e.to_string()))?;
                    return Ok(Value::Instant(instant));
                }
            }
            Err(EvalError::deserialize(format!(
                "objects must be {{\"symbol\": ..}} or {{\"instant\": ..}}, got {}",
                v
            )))
        }
    }
}

/// Encode a value as JSON, the inverse of [`value_from_json`].
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            let text = n.normalize().to_string();
            match serde_json::Number::from_str(&text) {
                Ok(num) => serde_json::Value::Number(num),
                Err(_) => serde_json::Value::String(text),
            }
        }
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Symbol(s) => serde_json::json!({ "symbol": s }),
        Value::Instant(t) => {
            let stamp = t.format(&Rfc3339).unwrap_or_else(|_| t.to_string());
            serde_json::json!({ "instant": stamp })
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

fn parse_number(text: &str) -> Result<Decimal, EvalError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| EvalError::deserialize(format!("number {} out of range: {}", text, e)))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
