//! Kind-aware equality and ordering.
//!
//! Equality never fails on mismatched kinds: a Number is simply not
//! equal to a Text. Ordering is only defined for Number/Number and for
//! temporal pairs, anything else is a `TypeMismatch`. A Text operand
//! paired with an Instant is read as a timestamp literal in the current
//! zone scope; both sides then compare as absolute instants. Two Text
//! operands order as instants when both are timestamp literals, the same
//! way `day_of_week` accepts a Text timestamp.

use std::cmp::Ordering;

use crate::timestamp::parse_literal;
use crate::types::{EvalError, Value};
use crate::zone::ZoneResolver;

/// Equality as used by `eq`, `except`, `in` and `include`.
pub fn values_equal(
    literal: &Value,
    actual: &Value,
    zones: &ZoneResolver<'_>,
) -> Result<bool, EvalError> {
    match (literal, actual) {
        (Value::Number(l), Value::Number(r)) => Ok(l == r),
        (Value::Text(l), Value::Text(r)) => Ok(l == r),
        (Value::Symbol(l), Value::Symbol(r)) => Ok(l == r),
        (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Instant(l), Value::Instant(r)) => Ok(l == r),
        (Value::Instant(_), Value::Text(_)) | (Value::Text(_), Value::Instant(_)) => {
            let l = zones.to_instant(literal)?;
            let r = zones.to_instant(actual)?;
            Ok(l == r)
        }
        (Value::List(l), Value::List(r)) => {
            if l.len() != r.len() {
                return Ok(false);
            }
            for (a, b) in l.iter().zip(r) {
                if !values_equal(a, b, zones)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Order `actual` relative to `literal` for the named condition.
pub fn compare_order(
    actual: &Value,
    literal: &Value,
    zones: &ZoneResolver<'_>,
    condition: &str,
) -> Result<Ordering, EvalError> {
    match (actual, literal) {
        (Value::Number(l), Value::Number(r)) => Ok(l.cmp(r)),
        (Value::Text(l), Value::Text(r))
            if parse_literal(l).is_ok() && parse_literal(r).is_ok() =>
        {
            Ok(zones.parse(l)?.cmp(&zones.parse(r)?))
        }
        (Value::Instant(_), Value::Instant(_) | Value::Text(_))
        | (Value::Text(_), Value::Instant(_)) => {
            match (zones.to_instant(actual)?, zones.to_instant(literal)?) {
                (Some(l), Some(r)) => Ok(l.cmp(&r)),
                _ => Err(mismatch(actual, literal, condition)),
            }
        }
        _ => Err(mismatch(actual, literal, condition)),
    }
}

fn mismatch(actual: &Value, literal: &Value, condition: &str) -> EvalError {
    EvalError::TypeMismatch {
        condition: condition.to_string(),
        expected: "two Numbers or two temporal values".to_string(),
        got: format!("{} and {}", actual.type_name(), literal.type_name()),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
