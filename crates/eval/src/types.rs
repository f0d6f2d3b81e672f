//! Runtime value types and the evaluation error model.
//!
//! Values are a closed sum type: every fact in a context and every
//! literal operand in a condition tree is one of these kinds. Equality
//! and ordering are defined per kind in `compare`; incompatible kinds
//! are never coerced into one another, with the single exception of
//! text timestamps meeting a temporal value.

use std::fmt;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Boxed error produced by a lazy context value.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur while building or evaluating a rule set.
///
/// A context key that is simply absent is never an error: leaves that
/// reference it evaluate to false and evaluation carries on.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A `cond` node with an odd number of children, an unknown
    /// condition kind, or an invalid literal operand.
    #[error("malformed condition: {message}")]
    MalformedCondition { message: String },

    /// An ordering, `include` or `day_of_week` condition met operands of
    /// the wrong kind.
    #[error("type mismatch in '{condition}': expected {expected}, got {got}")]
    TypeMismatch {
        condition: String,
        expected: String,
        got: String,
    },

    /// An unparseable timestamp literal or a zone unknown to the zone
    /// database.
    #[error("invalid timestamp '{literal}': {reason}")]
    InvalidTimestamp { literal: String, reason: String },

    /// A condition kind that is reserved but has no semantics yet.
    #[error("condition '{condition}' is not implemented")]
    NotImplemented { condition: String },

    /// A lazy context value failed while being forced. The thunk's own
    /// error is kept as the source.
    #[error("lazy value for '{key}' failed: {source}")]
    LazyFailed {
        key: String,
        #[source]
        source: BoxError,
    },

    /// Rule set or facts JSON did not have the expected shape.
    #[error("deserialization error: {message}")]
    Deserialize { message: String },
}

impl EvalError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        EvalError::MalformedCondition {
            message: message.into(),
        }
    }

    pub(crate) fn deserialize(message: impl Into<String>) -> Self {
        EvalError::Deserialize {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_timestamp(literal: &str, reason: impl Into<String>) -> Self {
        EvalError::InvalidTimestamp {
            literal: literal.to_string(),
            reason: reason.into(),
        }
    }
}

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A fact or literal value.
///
/// Numbers use `rust_decimal::Decimal` -- never `f64`. Instants carry
/// their own fixed offset; equality between two instants compares the
/// absolute point in time, not the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(Decimal),
    Text(String),
    Symbol(String),
    Bool(bool),
    Nil,
    Instant(OffsetDateTime),
    List(Vec<Value>),
}

impl Value {
    /// Build a symbolic label, e.g. `:friday`.
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Symbol(_) => "Symbol",
            Value::Bool(_) => "Bool",
            Value::Nil => "Nil",
            Value::Instant(_) => "Instant",
            Value::List(_) => "List",
        }
    }

    /// Everything except `false` and `nil` counts as true for `assert`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
            Value::Instant(t) => match t.format(&Rfc3339) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "{}", t),
            },
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(t: OffsetDateTime) -> Self {
        Value::Instant(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
