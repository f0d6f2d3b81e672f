//! Explicit builders for condition trees and rule sets.
//!
//! `TreeBuilder` keeps a stack of open child lists over one arena. A
//! combinator pushes a fresh list, runs the caller's closure to fill it,
//! pops it and appends the finished node to the enclosing list, so
//! children always exist before their parent. Leaf methods never fail;
//! the first invalid literal is remembered and reported by `finish` or
//! `RuleSetBuilder::build`.

use std::sync::Arc;

use crate::condition::{weekday_literal, CompareOp, ConditionTree, Leaf, Node, NodeId, NodeKind};
use crate::ruleset::{Outcome, RuleSet};
use crate::types::{EvalError, Value};
use crate::zone::TimeZoneDatabase;

/// Builds condition nodes into a shared arena.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: ConditionTree,
    frames: Vec<Vec<NodeId>>,
    error: Option<EvalError>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            tree: ConditionTree::new(),
            frames: vec![Vec::new()],
            error: None,
        }
    }

    /// Finish building, returning the arena and the top-level nodes.
    pub fn finish(mut self) -> Result<(ConditionTree, Vec<NodeId>), EvalError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let roots = self.frames.pop().unwrap_or_default();
        Ok((self.tree, roots))
    }

    /// Record a build error; only the first one is kept.
    pub fn fail(&mut self, err: EvalError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn append(&mut self, kind: NodeKind, children: Vec<NodeId>) {
        let id = self.tree.push(Node { kind, children });
        if let Some(frame) = self.frames.last_mut() {
            frame.push(id);
        }
    }

    /// Collect whatever `build` appends, without creating a node for it.
    fn collect(&mut self, build: impl FnOnce(&mut Self)) -> Vec<NodeId> {
        self.frames.push(Vec::new());
        build(self);
        self.frames.pop().unwrap_or_default()
    }

    fn group(&mut self, kind: NodeKind, build: impl FnOnce(&mut Self)) -> &mut Self {
        let children = self.collect(build);
        self.append(kind, children);
        self
    }

    /// One node standing for `ids` as a conjunction, if there are any.
    fn conjunction(&mut self, ids: Vec<NodeId>) -> Option<NodeId> {
        match ids.len() {
            0 => None,
            1 => Some(ids[0]),
            _ => Some(self.tree.push(Node {
                kind: NodeKind::All,
                children: ids,
            })),
        }
    }

    // ── combinators ────────────────────────────────

    pub fn all(&mut self, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(NodeKind::All, build)
    }

    pub fn any(&mut self, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(NodeKind::Any, build)
    }

    /// Children are read as (predicate, consequence) pairs.
    pub fn cond(&mut self, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(NodeKind::Cond, build)
    }

    /// Temporal matchers directly inside `build` resolve against `zone`.
    pub fn tz(&mut self, zone: impl Into<String>, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(NodeKind::Tz { zone: zone.into() }, build)
    }

    // ── leaves ─────────────────────────────────────

    pub fn leaf(&mut self, leaf: Leaf) -> &mut Self {
        self.append(NodeKind::Leaf(leaf), Vec::new());
        self
    }

    /// A leaf that additionally requires every child built by `build`.
    pub fn leaf_with(&mut self, leaf: Leaf, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.group(NodeKind::Leaf(leaf), build)
    }

    pub fn assert(&mut self, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::Assert { key: key.into() })
    }

    pub fn eq(&mut self, value: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::Eq {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn except(&mut self, value: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::Except {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn compare(
        &mut self,
        op: CompareOp,
        value: impl Into<Value>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.leaf(Leaf::Compare {
            op,
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn greater_than(&mut self, value: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        self.compare(CompareOp::GreaterThan, value, key)
    }

    pub fn greater_than_or_equal(
        &mut self,
        value: impl Into<Value>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.compare(CompareOp::GreaterThanOrEqual, value, key)
    }

    pub fn less_than(&mut self, value: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        self.compare(CompareOp::LessThan, value, key)
    }

    pub fn less_than_or_equal(
        &mut self,
        value: impl Into<Value>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.compare(CompareOp::LessThanOrEqual, value, key)
    }

    /// Inclusive range. `low <= high` is the caller's responsibility.
    pub fn between(
        &mut self,
        low: impl Into<Value>,
        high: impl Into<Value>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.leaf(Leaf::Between {
            key: key.into(),
            low: low.into(),
            high: high.into(),
        })
    }

    pub fn is_in(&mut self, values: Vec<Value>, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::In {
            key: key.into(),
            values,
        })
    }

    pub fn include(&mut self, value: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::Include {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn in_cyclic_order(&mut self, values: Vec<Value>, key: impl Into<String>) -> &mut Self {
        self.leaf(Leaf::InCyclicOrder {
            key: key.into(),
            values,
        })
    }

    /// `day` is a weekday name or an index, 0 being Sunday.
    pub fn day_of_week(&mut self, day: impl Into<Value>, key: impl Into<String>) -> &mut Self {
        match weekday_literal(&day.into()) {
            Ok(day) => self.leaf(Leaf::DayOfWeek {
                key: key.into(),
                day,
            }),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }
}

// ──────────────────────────────────────────────
// RuleSetBuilder
// ──────────────────────────────────────────────

/// Builds a `RuleSet`: top-level conditions, ordered outcomes, fallback.
#[derive(Debug)]
pub struct RuleSetBuilder {
    nodes: TreeBuilder,
    outcomes: Vec<Outcome>,
    fallback: Value,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        RuleSetBuilder {
            nodes: TreeBuilder::new(),
            outcomes: Vec::new(),
            fallback: Value::Nil,
        }
    }

    /// Add top-level conditions; all of them must hold before any
    /// outcome is considered.
    pub fn conditions(&mut self, build: impl FnOnce(&mut TreeBuilder)) -> &mut Self {
        build(&mut self.nodes);
        self
    }

    /// Add an outcome whose guard is the conjunction of what `build` adds.
    /// A guard with no conditions always matches.
    pub fn outcome(
        &mut self,
        value: impl Into<Value>,
        build: impl FnOnce(&mut TreeBuilder),
    ) -> &mut Self {
        let ids = self.nodes.collect(build);
        let guard = self.nodes.conjunction(ids);
        self.outcomes.push(Outcome {
            guard,
            value: value.into(),
        });
        self
    }

    /// Add an unconditional outcome.
    pub fn otherwise(&mut self, value: impl Into<Value>) -> &mut Self {
        self.outcomes.push(Outcome {
            guard: None,
            value: value.into(),
        });
        self
    }

    /// Value returned when nothing matches. Defaults to nil.
    pub fn fallback(&mut self, value: impl Into<Value>) -> &mut Self {
        self.fallback = value.into();
        self
    }

    pub fn build(mut self, zones: Arc<dyn TimeZoneDatabase>) -> Result<RuleSet, EvalError> {
        if let Some(err) = self.nodes.error.take() {
            return Err(err);
        }
        let roots = self.nodes.frames.pop().unwrap_or_default();
        let guard = self.nodes.conjunction(roots);
        Ok(RuleSet::new(
            self.nodes.tree,
            guard,
            self.outcomes,
            self.fallback,
            zones,
        ))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
