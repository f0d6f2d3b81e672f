//! Rule set interchange JSON.
//!
//! ```json
//! {
//!   "conditions": [ { "kind": "eq", "key": "day_of_week", "value": {"symbol": "friday"} } ],
//!   "outcomes": [
//!     { "value": 8, "when": [ { "kind": "greater_than_or_equal", "key": "amount", "value": 300 } ] },
//!     { "value": 3 }
//!   ],
//!   "fallback": 0
//! }
//! ```
//!
//! Leaves carry `key` plus `value`, `low`/`high` (between) or `values`
//! (in, in_cyclic_order), and may nest `children`. Combinators `all`,
//! `any` and `cond` carry `children`; `tz` also carries `zone`. Values
//! use the encoding described in `assemble`.

use std::sync::Arc;

use crate::assemble::value_from_json;
use crate::builder::TreeBuilder;
use crate::condition::{weekday_literal, CompareOp, Leaf};
use crate::ruleset::RuleSet;
use crate::types::{EvalError, Value};
use crate::zone::TimeZoneDatabase;

impl RuleSet {
    /// Deserialize a rule set from interchange JSON.
    pub fn from_interchange(
        doc: &serde_json::Value,
        zones: Arc<dyn TimeZoneDatabase>,
    ) -> Result<RuleSet, EvalError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| EvalError::deserialize("rule set must be a JSON object"))?;

        let mut builder = RuleSet::builder();

        if let Some(conditions) = obj.get("conditions") {
            let conditions = as_array(conditions, "conditions")?;
            builder.conditions(|b| add_conditions(b, conditions));
        }

        if let Some(outcomes) = obj.get("outcomes") {
            for (index, outcome) in as_array(outcomes, "outcomes")?.iter().enumerate() {
                let value = outcome.get("value").ok_or_else(|| {
                    EvalError::deserialize(format!("outcome {} missing 'value'", index))
                })?;
                let value = value_from_json(value)?;
                match outcome.get("when") {
                    Some(when) => {
                        let when = as_array(when, "when")?;
                        builder.outcome(value, |b| add_conditions(b, when));
                    }
                    None => {
                        builder.otherwise(value);
                    }
                }
            }
        }

        if let Some(fallback) = obj.get("fallback") {
            builder.fallback(value_from_json(fallback)?);
        }

        builder.build(zones)
    }
}

fn as_array<'v>(
    v: &'v serde_json::Value,
    field: &str,
) -> Result<&'v [serde_json::Value], EvalError> {
    v.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| EvalError::deserialize(format!("'{}' must be an array", field)))
}

fn get_str<'v>(obj: &'v serde_json::Value, field: &str) -> Result<&'v str, EvalError> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| EvalError::deserialize(format!("missing string field '{}'", field)))
}

fn get_value(obj: &serde_json::Value, field: &str) -> Result<Value, EvalError> {
    let raw = obj
        .get(field)
        .ok_or_else(|| EvalError::deserialize(format!("missing field '{}'", field)))?;
    value_from_json(raw)
}

fn get_values(obj: &serde_json::Value, field: &str) -> Result<Vec<Value>, EvalError> {
    let raw = obj
        .get(field)
        .ok_or_else(|| EvalError::deserialize(format!("missing field '{}'", field)))?;
    as_array(raw, field)?.iter().map(value_from_json).collect()
}

/// Errors are recorded on the builder and surface from `build`.
fn add_conditions(b: &mut TreeBuilder, items: &[serde_json::Value]) {
    for item in items {
        if let Err(err) = add_condition(b, item) {
            b.fail(err);
        }
    }
}

fn add_condition(b: &mut TreeBuilder, item: &serde_json::Value) -> Result<(), EvalError> {
    let kind = get_str(item, "kind")?;
    let children = match item.get("children") {
        Some(children) => as_array(children, "children")?,
        None => &[],
    };

    match kind {
        "all" => {
            b.all(|b| add_conditions(b, children));
        }
        "any" => {
            b.any(|b| add_conditions(b, children));
        }
        "cond" => {
            b.cond(|b| add_conditions(b, children));
        }
        "tz" => {
            let zone = get_str(item, "zone")?;
            b.tz(zone, |b| add_conditions(b, children));
        }
        _ => {
            let leaf = parse_leaf(kind, item)?;
            if children.is_empty() {
                b.leaf(leaf);
            } else {
                b.leaf_with(leaf, |b| add_conditions(b, children));
            }
        }
    }
    Ok(())
}

fn parse_leaf(kind: &str, item: &serde_json::Value) -> Result<Leaf, EvalError> {
    let key = || get_str(item, "key").map(str::to_string);
    let compare = |op| -> Result<Leaf, EvalError> {
        Ok(Leaf::Compare {
            op,
            key: key()?,
            value: get_value(item, "value")?,
        })
    };

    match kind {
        "assert" => Ok(Leaf::Assert { key: key()? }),
        "eq" => Ok(Leaf::Eq {
            key: key()?,
            value: get_value(item, "value")?,
        }),
        "except" => Ok(Leaf::Except {
            key: key()?,
            value: get_value(item, "value")?,
        }),
        "greater_than" => compare(CompareOp::GreaterThan),
        "greater_than_or_equal" => compare(CompareOp::GreaterThanOrEqual),
        "less_than" => compare(CompareOp::LessThan),
        "less_than_or_equal" => compare(CompareOp::LessThanOrEqual),
        "between" => Ok(Leaf::Between {
            key: key()?,
            low: get_value(item, "low")?,
            high: get_value(item, "high")?,
        }),
        "in" => Ok(Leaf::In {
            key: key()?,
            values: get_values(item, "values")?,
        }),
        "include" => Ok(Leaf::Include {
            key: key()?,
            value: get_value(item, "value")?,
        }),
        "in_cyclic_order" => Ok(Leaf::InCyclicOrder {
            key: key()?,
            values: get_values(item, "values")?,
        }),
        "day_of_week" => Ok(Leaf::DayOfWeek {
            key: key()?,
            day: weekday_literal(&get_value(item, "value")?)?,
        }),
        other => Err(EvalError::malformed(format!(
            "unknown condition kind '{}'",
            other
        ))),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
