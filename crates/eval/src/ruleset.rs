//! Outcome dispatch.
//!
//! A rule set is checked in two steps: the top-level guard first, then
//! the outcomes in declared order. The first outcome whose guard holds
//! supplies the result and nothing after it is evaluated, so lazy facts
//! referenced only by later outcomes are never forced. If the top-level
//! guard fails or no outcome matches, the fallback is returned.

use std::fmt;
use std::sync::Arc;

use crate::builder::RuleSetBuilder;
use crate::condition::{ConditionTree, NodeId};
use crate::context::{Context, Facts};
use crate::predicate::eval_condition;
use crate::types::{EvalError, Value};
use crate::zone::{TimeZoneDatabase, ZoneResolver};

/// A guarded value. An outcome without a guard always matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub(crate) guard: Option<NodeId>,
    pub(crate) value: Value,
}

impl Outcome {
    pub fn guard(&self) -> Option<NodeId> {
        self.guard
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// An immutable, built rule set. `call` may run concurrently from any
/// number of threads; each call owns its own context.
pub struct RuleSet {
    tree: ConditionTree,
    guard: Option<NodeId>,
    outcomes: Vec<Outcome>,
    fallback: Value,
    zones: Arc<dyn TimeZoneDatabase>,
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("nodes", &self.tree.len())
            .field("guard", &self.guard)
            .field("outcomes", &self.outcomes)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    pub(crate) fn new(
        tree: ConditionTree,
        guard: Option<NodeId>,
        outcomes: Vec<Outcome>,
        fallback: Value,
        zones: Arc<dyn TimeZoneDatabase>,
    ) -> Self {
        RuleSet {
            tree,
            guard,
            outcomes,
            fallback,
            zones,
        }
    }

    /// Evaluate against `facts` and return the selected value.
    pub fn call(&self, facts: Facts) -> Result<Value, EvalError> {
        let mut ctx = Context::new(facts);
        self.call_with(&mut ctx)
    }

    /// Like [`RuleSet::call`], leaving the context with the caller so it
    /// can be inspected afterwards (e.g. how many lazy facts were forced).
    pub fn call_with(&self, ctx: &mut Context) -> Result<Value, EvalError> {
        let mut zones = ZoneResolver::new(self.zones.as_ref());

        if !self.holds(self.guard, ctx, &mut zones)? {
            tracing::debug!("top-level conditions not met, returning fallback");
            return Ok(self.fallback.clone());
        }

        for (index, outcome) in self.outcomes.iter().enumerate() {
            if self.holds(outcome.guard, ctx, &mut zones)? {
                tracing::debug!(outcome = index, value = %outcome.value, "outcome matched");
                return Ok(outcome.value.clone());
            }
        }

        tracing::debug!("no outcome matched, returning fallback");
        Ok(self.fallback.clone())
    }

    fn holds<'a>(
        &'a self,
        guard: Option<NodeId>,
        ctx: &mut Context,
        zones: &mut ZoneResolver<'a>,
    ) -> Result<bool, EvalError> {
        match guard {
            Some(id) => eval_condition(&self.tree, id, ctx, zones),
            None => Ok(true),
        }
    }

    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    pub fn guard(&self) -> Option<NodeId> {
        self.guard
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn fallback(&self) -> &Value {
        &self.fallback
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
