//! Time zone resolution.
//!
//! The zone database is injected through `TimeZoneDatabase`; the
//! evaluator never reaches for a global one. `ZoneResolver` carries the
//! lexical `tz` scope stack for a single evaluation and turns temporal
//! operands into absolute instants (for equality and ordering) or into
//! zone-local readings (for weekday matching).
//!
//! Scope visibility: a `tz` node's zone is seen by its direct children
//! only. Every other combinator pushes a barrier that hides enclosing
//! zones, so deeper matchers need their own nested `tz`.

use std::collections::HashMap;

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::timestamp::parse_literal;
use crate::types::{EvalError, Value};

// ──────────────────────────────────────────────
// Zone database
// ──────────────────────────────────────────────

/// Offset lookups by zone identifier and instant.
pub trait TimeZoneDatabase: Send + Sync {
    /// UTC offset in effect in `zone_id` at `instant`, or `None` when the
    /// zone is unknown.
    fn offset(&self, zone_id: &str, instant: OffsetDateTime) -> Option<UtcOffset>;

    /// Whether `zone_id` names a zone this database knows.
    fn is_valid(&self, zone_id: &str) -> bool;
}

/// Offset rules for one zone: a base offset and dated transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRules {
    base: UtcOffset,
    transitions: Vec<(OffsetDateTime, UtcOffset)>,
}

impl ZoneRules {
    pub fn fixed(offset: UtcOffset) -> Self {
        ZoneRules {
            base: offset,
            transitions: Vec::new(),
        }
    }

    /// From `at` onwards the zone uses `offset`, until a later transition.
    pub fn with_transition(mut self, at: OffsetDateTime, offset: UtcOffset) -> Self {
        let pos = self.transitions.partition_point(|(t, _)| *t <= at);
        self.transitions.insert(pos, (at, offset));
        self
    }

    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        let pos = self.transitions.partition_point(|(t, _)| *t <= instant);
        if pos == 0 {
            self.base
        } else {
            self.transitions[pos - 1].1
        }
    }
}

/// Table-driven zone database.
///
/// Always knows `UTC` and `Etc/UTC`; other zones are registered by the
/// embedding application or loaded from configuration.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: HashMap<String, ZoneRules>,
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneTable {
    pub fn new() -> Self {
        let mut zones = HashMap::new();
        zones.insert("UTC".to_string(), ZoneRules::fixed(UtcOffset::UTC));
        zones.insert("Etc/UTC".to_string(), ZoneRules::fixed(UtcOffset::UTC));
        ZoneTable { zones }
    }

    pub fn insert(&mut self, zone_id: impl Into<String>, rules: ZoneRules) -> &mut Self {
        self.zones.insert(zone_id.into(), rules);
        self
    }

    pub fn with_zone(mut self, zone_id: impl Into<String>, rules: ZoneRules) -> Self {
        self.insert(zone_id, rules);
        self
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl TimeZoneDatabase for ZoneTable {
    fn offset(&self, zone_id: &str, instant: OffsetDateTime) -> Option<UtcOffset> {
        self.zones.get(zone_id).map(|rules| rules.offset_at(instant))
    }

    fn is_valid(&self, zone_id: &str) -> bool {
        self.zones.contains_key(zone_id)
    }
}

// ──────────────────────────────────────────────
// Resolver
// ──────────────────────────────────────────────

/// Zone scope stack and temporal normalization for one evaluation.
pub struct ZoneResolver<'a> {
    db: &'a dyn TimeZoneDatabase,
    scopes: Vec<Option<&'a str>>,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(db: &'a dyn TimeZoneDatabase) -> Self {
        ZoneResolver {
            db,
            scopes: Vec::new(),
        }
    }

    /// Run `f` with `zone` pushed as the innermost scope; `None` pushes a
    /// barrier. The scope is popped whether `f` succeeds or fails.
    pub fn scoped<T>(&mut self, zone: Option<&'a str>, f: impl FnOnce(&mut Self) -> T) -> T {
        tracing::trace!(zone = zone.unwrap_or("<barrier>"), "enter zone scope");
        self.scopes.push(zone);
        let out = f(self);
        self.scopes.pop();
        tracing::trace!(zone = zone.unwrap_or("<barrier>"), "leave zone scope");
        out
    }

    /// The zone visible at this point, `None` meaning UTC.
    pub fn effective_zone(&self) -> Option<&'a str> {
        self.scopes.last().copied().flatten()
    }

    /// Parse a timestamp literal into an absolute instant. An in-literal
    /// zone wins over the enclosing scope, which wins over UTC.
    pub fn parse(&self, literal: &str) -> Result<OffsetDateTime, EvalError> {
        let parsed = parse_literal(literal)?;
        let zone = parsed.zone.as_deref().or(self.effective_zone());
        self.assume_zone(parsed.local, zone, literal)
    }

    /// Interpret an operand as an instant: instants as they are, text
    /// through the literal parser. Other kinds yield `None`.
    pub fn to_instant(&self, value: &Value) -> Result<Option<OffsetDateTime>, EvalError> {
        match value {
            Value::Instant(t) => Ok(Some(*t)),
            Value::Text(s) => self.parse(s).map(Some),
            _ => Ok(None),
        }
    }

    /// Project an instant into the effective zone's wall clock.
    pub fn to_local(&self, instant: OffsetDateTime) -> Result<OffsetDateTime, EvalError> {
        self.to_local_in(instant, self.effective_zone())
    }

    /// Project an instant into `zone`'s wall clock, `None` meaning UTC.
    pub fn to_local_in(
        &self,
        instant: OffsetDateTime,
        zone: Option<&str>,
    ) -> Result<OffsetDateTime, EvalError> {
        match zone {
            None => Ok(instant.to_offset(UtcOffset::UTC)),
            Some(zone) => {
                let offset = self
                    .db
                    .offset(zone, instant)
                    .ok_or_else(|| EvalError::invalid_timestamp(zone, "unknown time zone"))?;
                Ok(instant.to_offset(offset))
            }
        }
    }

    /// Zone-local reading of a temporal operand. Text is read in the zone
    /// it names, falling back to the effective zone; instants project
    /// into the effective zone. Other kinds yield `None`.
    pub fn local_reading(&self, value: &Value) -> Result<Option<OffsetDateTime>, EvalError> {
        match value {
            Value::Instant(t) => self.to_local(*t).map(Some),
            Value::Text(s) => {
                let parsed = parse_literal(s)?;
                let zone = parsed.zone.as_deref().or(self.effective_zone());
                let instant = self.assume_zone(parsed.local, zone, s)?;
                self.to_local_in(instant, zone).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Pin a wall-clock reading to a zone. The offset is looked up at the
    /// reading taken as UTC, then re-checked at the resulting instant so
    /// readings near a transition land on the right side of it.
    fn assume_zone(
        &self,
        local: PrimitiveDateTime,
        zone: Option<&str>,
        literal: &str,
    ) -> Result<OffsetDateTime, EvalError> {
        let Some(zone) = zone else {
            return Ok(local.assume_utc());
        };
        if !self.db.is_valid(zone) {
            return Err(EvalError::invalid_timestamp(
                literal,
                format!("unknown time zone '{}'", zone),
            ));
        }
        let lookup = |at: OffsetDateTime| {
            self.db.offset(zone, at).ok_or_else(|| {
                EvalError::invalid_timestamp(literal, format!("no offset for zone '{}'", zone))
            })
        };

        let first = lookup(local.assume_utc())?;
        let candidate = local.assume_offset(first);
        let second = lookup(candidate)?;
        if second == first {
            Ok(candidate)
        } else {
            Ok(local.assume_offset(second))
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
