//! Condition tree data model.
//!
//! Nodes live in an arena (`ConditionTree`) and refer to their children
//! by `NodeId`. A node can only be pushed after all of its children
//! exist, so every child id is smaller than its parent's and the tree is
//! acyclic by construction. Once built, a tree is never mutated.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use time::Weekday;

use crate::types::{EvalError, Value};

/// Index of a node in its `ConditionTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordering comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::GreaterThan => "greater_than",
            CompareOp::GreaterThanOrEqual => "greater_than_or_equal",
            CompareOp::LessThan => "less_than",
            CompareOp::LessThanOrEqual => "less_than_or_equal",
        }
    }

    /// Whether `actual <op> literal` holds given their ordering.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// A matcher bound to one context key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Assert { key: String },
    Eq { key: String, value: Value },
    Except { key: String, value: Value },
    Compare { op: CompareOp, key: String, value: Value },
    Between { key: String, low: Value, high: Value },
    In { key: String, values: Vec<Value> },
    Include { key: String, value: Value },
    InCyclicOrder { key: String, values: Vec<Value> },
    DayOfWeek { key: String, day: Weekday },
}

impl Leaf {
    pub fn key(&self) -> &str {
        match self {
            Leaf::Assert { key }
            | Leaf::Eq { key, .. }
            | Leaf::Except { key, .. }
            | Leaf::Compare { key, .. }
            | Leaf::Between { key, .. }
            | Leaf::In { key, .. }
            | Leaf::Include { key, .. }
            | Leaf::InCyclicOrder { key, .. }
            | Leaf::DayOfWeek { key, .. } => key,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Leaf::Assert { .. } => "assert",
            Leaf::Eq { .. } => "eq",
            Leaf::Except { .. } => "except",
            Leaf::Compare { op, .. } => op.name(),
            Leaf::Between { .. } => "between",
            Leaf::In { .. } => "in",
            Leaf::Include { .. } => "include",
            Leaf::InCyclicOrder { .. } => "in_cyclic_order",
            Leaf::DayOfWeek { .. } => "day_of_week",
        }
    }
}

/// Node kinds: leaves and combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A matcher; with children it is "matcher AND all children".
    Leaf(Leaf),
    All,
    Any,
    /// Children are (predicate, consequence) pairs.
    Cond,
    /// Zone scope for the direct children.
    Tz { zone: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// Arena of condition nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionTree {
    nodes: Vec<Node>,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        debug_assert!(node.children.iter().all(|c| c.index() < self.nodes.len()));
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}

/// Read a `day_of_week` literal: 0 (Sunday) through 6 (Saturday), or a
/// weekday name, full or abbreviated, as a symbol or text.
pub fn weekday_literal(value: &Value) -> Result<Weekday, EvalError> {
    match value {
        Value::Number(n) => {
            let day = n
                .to_u8()
                .filter(|d| n.fract().is_zero() && *d <= 6)
                .ok_or_else(|| {
                    EvalError::malformed(format!("day_of_week index {} is not in 0..=6", n))
                })?;
            Ok(Weekday::Sunday.nth_next(day))
        }
        Value::Symbol(name) | Value::Text(name) => match name.to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(Weekday::Sunday),
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            _ => Err(EvalError::malformed(format!(
                "'{}' is not a weekday name",
                name
            ))),
        },
        other => Err(EvalError::malformed(format!(
            "day_of_week expects a weekday name or index, got {}",
            other.type_name()
        ))),
    }
}
