//! Docket rule evaluator -- accepts a rule set (built in code or loaded
//! from interchange JSON) plus facts, produces the selected outcome.
//!
//! A rule set is a tree of declarative conditions over named facts,
//! followed by an ordered list of guarded outcomes and a fallback.
//! Facts may be lazy: a thunk is forced the first time a condition
//! reads its key and never again within the same call. Timestamp
//! literals resolve against the enclosing `tz` scope through a
//! pluggable [`TimeZoneDatabase`].

pub mod assemble;
pub mod builder;
pub mod compare;
pub mod condition;
pub mod context;
pub mod interchange;
pub mod predicate;
pub mod ruleset;
pub mod timestamp;
pub mod types;
pub mod zone;

use std::sync::Arc;

pub use builder::{RuleSetBuilder, TreeBuilder};
pub use condition::{CompareOp, ConditionTree, Leaf, Node, NodeId, NodeKind};
pub use context::{Context, Fact, Facts, Thunk};
pub use ruleset::{Outcome, RuleSet};
pub use types::{BoxError, EvalError, Value};
pub use zone::{TimeZoneDatabase, ZoneResolver, ZoneRules, ZoneTable};

/// Evaluate an interchange rule set against a JSON facts document.
///
/// This is the top-level entry point used by the CLI and the
/// conformance suite. Programmatic callers that need lazy facts should
/// build `Facts` themselves and call [`RuleSet::call`].
pub fn evaluate(
    rules: &serde_json::Value,
    facts: &serde_json::Value,
    zones: Arc<dyn TimeZoneDatabase>,
) -> Result<Value, EvalError> {
    let rule_set = RuleSet::from_interchange(rules, zones)?;
    let facts = assemble::assemble_facts(facts)?;
    rule_set.call(facts)
}
