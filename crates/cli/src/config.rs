//! Zone configuration for `docket eval --zones`.
//!
//! The zones TOML maps zone identifiers to a base UTC offset plus the
//! transitions that change it.
//!
//! # Example
//!
//! ```toml
//! [zones."America/New_York"]
//! offset = "-05:00"
//! transitions = [
//!   { at = "2015-03-08T07:00:00Z", offset = "-04:00" },
//!   { at = "2015-11-01T06:00:00Z", offset = "-05:00" },
//! ]
//!
//! [zones."Asia/Tokyo"]
//! offset = "+09:00"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use docket_eval::{TimeZoneDatabase, ZoneRules, ZoneTable};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level zones file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneConfig {
    /// Zone rules, keyed by zone identifier.
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneEntry>,
}

/// `[zones."<id>"]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    /// Offset in effect before the first transition, `+HH:MM` or `-HH:MM`.
    pub offset: String,
    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,
}

/// One offset change. `at` is an RFC 3339 instant.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionEntry {
    pub at: String,
    pub offset: String,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a zones TOML file from `path`.
///
/// Returns a human-readable error string on failure.
pub fn read_zone_config(path: &Path) -> Result<ZoneConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

impl ZoneConfig {
    /// Convert into a zone table. UTC is always present.
    pub fn into_table(self) -> Result<ZoneTable, String> {
        let mut table = ZoneTable::new();
        for (id, entry) in self.zones {
            let mut rules = ZoneRules::fixed(parse_offset(&id, &entry.offset)?);
            for transition in &entry.transitions {
                let at = OffsetDateTime::parse(&transition.at, &Rfc3339).map_err(|e| {
                    format!(
                        "zone '{}': invalid transition time '{}': {}",
                        id, transition.at, e
                    )
                })?;
                rules = rules.with_transition(at, parse_offset(&id, &transition.offset)?);
            }
            tracing::debug!(zone = %id, transitions = entry.transitions.len(), "loaded zone");
            table.insert(id, rules);
        }
        Ok(table)
    }
}

fn parse_offset(zone: &str, text: &str) -> Result<UtcOffset, String> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(text, format)
        .map_err(|e| format!("zone '{}': invalid offset '{}': {}", zone, text, e))
}

/// Build the zone database for a command: the file at `path` if given,
/// otherwise UTC only.
pub fn load_zones(path: Option<&Path>) -> Result<Arc<dyn TimeZoneDatabase>, String> {
    let table = match path {
        Some(path) => read_zone_config(path)?.into_table()?,
        None => ZoneTable::new(),
    };
    Ok(Arc::new(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parse(text: &str) -> Result<ZoneTable, String> {
        let config: ZoneConfig = toml::from_str(text).map_err(|e| e.to_string())?;
        config.into_table()
    }

    #[test]
    fn zones_with_transitions() {
        let table = parse(
            r#"
            [zones."America/New_York"]
            offset = "-05:00"
            transitions = [
              { at = "2015-03-08T07:00:00Z", offset = "-04:00" },
            ]

            [zones."Asia/Tokyo"]
            offset = "+09:00"
            "#,
        )
        .unwrap();

        // UTC and Etc/UTC are seeded.
        assert_eq!(table.len(), 4);
        let winter = table.offset("America/New_York", datetime!(2015-01-01 12:00 UTC));
        let summer = table.offset("America/New_York", datetime!(2015-07-01 12:00 UTC));
        assert_eq!(winter, Some(UtcOffset::from_hms(-5, 0, 0).unwrap()));
        assert_eq!(summer, Some(UtcOffset::from_hms(-4, 0, 0).unwrap()));
        assert!(table.is_valid("Asia/Tokyo"));
    }

    #[test]
    fn empty_file_is_utc_only() {
        let table = parse("").unwrap();
        assert!(table.is_valid("UTC"));
        assert!(!table.is_valid("Asia/Tokyo"));
    }

    #[test]
    fn bad_offset_names_the_zone() {
        let err = parse(
            r#"
            [zones."Mars/Olympus"]
            offset = "5 hours"
            "#,
        )
        .unwrap_err();
        assert!(err.contains("Mars/Olympus"), "{}", err);
    }

    #[test]
    fn bad_transition_time() {
        let err = parse(
            r#"
            [zones."Asia/Tokyo"]
            offset = "+09:00"
            transitions = [ { at = "tomorrow", offset = "+10:00" } ]
            "#,
        )
        .unwrap_err();
        assert!(err.contains("invalid transition time"), "{}", err);
    }
}
