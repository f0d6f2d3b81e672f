//! Condition tree evaluator.
//!
//! Evaluation is a recursive walk over the arena. Children are always
//! visited in declared order and combinators stop as soon as the result
//! is known, which decides exactly which lazy context values get forced.
//! A key missing from the context makes its leaf false (true for
//! `except`) rather than failing.

use std::cmp::Ordering;

use crate::compare::{compare_order, values_equal};
use crate::condition::{ConditionTree, Leaf, NodeId, NodeKind};
use crate::context::Context;
use crate::types::{EvalError, Value};
use crate::zone::ZoneResolver;

/// Evaluate one node of `tree` against `ctx`.
pub fn eval_condition<'a>(
    tree: &'a ConditionTree,
    id: NodeId,
    ctx: &mut Context,
    zones: &mut ZoneResolver<'a>,
) -> Result<bool, EvalError> {
    let node = tree.node(id);
    match &node.kind {
        NodeKind::All => zones.scoped(None, |zones| eval_all(tree, &node.children, ctx, zones)),

        NodeKind::Any => zones.scoped(None, |zones| {
            for &child in &node.children {
                if eval_condition(tree, child, ctx, zones)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }),

        NodeKind::Cond => {
            if node.children.len() % 2 != 0 {
                return Err(EvalError::malformed(format!(
                    "cond needs predicate/consequence pairs, got {} children",
                    node.children.len()
                )));
            }
            zones.scoped(None, |zones| {
                for pair in node.children.chunks_exact(2) {
                    if eval_condition(tree, pair[0], ctx, zones)? {
                        return eval_condition(tree, pair[1], ctx, zones);
                    }
                }
                Ok(false)
            })
        }

        NodeKind::Tz { zone } => zones.scoped(Some(zone.as_str()), |zones| {
            eval_all(tree, &node.children, ctx, zones)
        }),

        NodeKind::Leaf(leaf) => {
            if !eval_leaf(leaf, ctx, zones)? {
                return Ok(false);
            }
            if node.children.is_empty() {
                return Ok(true);
            }
            zones.scoped(None, |zones| eval_all(tree, &node.children, ctx, zones))
        }
    }
}

/// Conjunction over `ids`, short-circuiting on the first false.
pub fn eval_all<'a>(
    tree: &'a ConditionTree,
    ids: &[NodeId],
    ctx: &mut Context,
    zones: &mut ZoneResolver<'a>,
) -> Result<bool, EvalError> {
    for &id in ids {
        if !eval_condition(tree, id, ctx, zones)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_leaf(leaf: &Leaf, ctx: &mut Context, zones: &ZoneResolver<'_>) -> Result<bool, EvalError> {
    if let Leaf::InCyclicOrder { .. } = leaf {
        return Err(not_implemented(leaf));
    }

    let Some(actual) = ctx.resolve(leaf.key())? else {
        // Absent never equals anything.
        return Ok(matches!(leaf, Leaf::Except { .. }));
    };

    match leaf {
        Leaf::Assert { .. } => Ok(actual.is_truthy()),

        Leaf::Eq { value, .. } => values_equal(value, actual, zones),

        Leaf::Except { value, .. } => Ok(!values_equal(value, actual, zones)?),

        Leaf::Compare { op, value, .. } => {
            let ordering = compare_order(actual, value, zones, op.name())?;
            Ok(op.holds(ordering))
        }

        Leaf::Between { low, high, .. } => {
            let above_low = compare_order(actual, low, zones, "between")? != Ordering::Less;
            let below_high = compare_order(actual, high, zones, "between")? != Ordering::Greater;
            Ok(above_low && below_high)
        }

        Leaf::In { values, .. } => {
            for value in values {
                if values_equal(value, actual, zones)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        Leaf::Include { value, .. } => match actual {
            Value::List(items) => {
                for item in items {
                    if values_equal(value, item, zones)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            other => Err(EvalError::TypeMismatch {
                condition: "include".to_string(),
                expected: "List".to_string(),
                got: other.type_name().to_string(),
            }),
        },

        Leaf::DayOfWeek { day, .. } => {
            let local = zones
                .local_reading(actual)?
                .ok_or_else(|| EvalError::TypeMismatch {
                    condition: "day_of_week".to_string(),
                    expected: "Instant or timestamp Text".to_string(),
                    got: actual.type_name().to_string(),
                })?;
            Ok(local.weekday() == *day)
        }

        Leaf::InCyclicOrder { .. } => Err(not_implemented(leaf)),
    }
}

fn not_implemented(leaf: &Leaf) -> EvalError {
    EvalError::NotImplemented {
        condition: leaf.name().to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
