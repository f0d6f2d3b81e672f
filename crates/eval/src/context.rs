//! Per-call fact context with once-only lazy values.
//!
//! `Facts` is the raw mapping a caller hands to `RuleSet::call`.
//! `Context` owns it for the duration of exactly one call: a lazy entry
//! is forced the first time a condition resolves its key, and the entry
//! is replaced by the produced value so later lookups never re-run the
//! thunk. Nothing is shared between calls.

use std::collections::HashMap;
use std::fmt;

use crate::types::{BoxError, EvalError, Value};

/// Deferred computation producing a context value.
pub type Thunk = Box<dyn FnOnce() -> Result<Value, BoxError> + Send>;

/// A single context entry.
pub enum Fact {
    Ready(Value),
    Lazy(Thunk),
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Fact::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Mapping from label to fact, consumed by one evaluation.
#[derive(Debug, Default)]
pub struct Facts {
    entries: HashMap<String, Fact>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ready value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), Fact::Ready(value.into()));
        self
    }

    /// Insert a value that is only computed if a condition needs it.
    pub fn insert_lazy<F>(&mut self, key: impl Into<String>, thunk: F) -> &mut Self
    where
        F: FnOnce() -> Result<Value, BoxError> + Send + 'static,
    {
        self.entries.insert(key.into(), Fact::Lazy(Box::new(thunk)));
        self
    }

    /// Chaining form of [`Facts::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Chaining form of [`Facts::insert_lazy`].
    pub fn with_lazy<F>(mut self, key: impl Into<String>, thunk: F) -> Self
    where
        F: FnOnce() -> Result<Value, BoxError> + Send + 'static,
    {
        self.insert_lazy(key, thunk);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Facts {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), Fact::Ready(v)))
            .collect();
        Facts { entries }
    }
}

// ──────────────────────────────────────────────
// Resolver
// ──────────────────────────────────────────────

/// Resolver over one call's facts.
#[derive(Debug)]
pub struct Context {
    entries: HashMap<String, Fact>,
    forced: usize,
}

impl Context {
    pub fn new(facts: Facts) -> Self {
        Context {
            entries: facts.entries,
            forced: 0,
        }
    }

    /// Resolve a key, forcing and memoizing a lazy entry.
    ///
    /// Returns `Ok(None)` when the key is not mapped. A failing thunk
    /// aborts with `LazyFailed`; its entry is gone afterwards, since the
    /// thunk was consumed and nothing was produced to memoize.
    pub fn resolve(&mut self, key: &str) -> Result<Option<&Value>, EvalError> {
        if let Some(Fact::Lazy(_)) = self.entries.get(key) {
            if let Some(Fact::Lazy(thunk)) = self.entries.remove(key) {
                tracing::trace!(key, "forcing lazy value");
                self.forced += 1;
                let value = thunk().map_err(|source| EvalError::LazyFailed {
                    key: key.to_string(),
                    source,
                })?;
                self.entries.insert(key.to_string(), Fact::Ready(value));
            }
        }

        match self.entries.get(key) {
            Some(Fact::Ready(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    /// Number of lazy values forced so far in this call.
    pub fn forced(&self) -> usize {
        self.forced
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
