//! Timestamp literal parser.
//!
//! Grammar: `YYYY-MM-DDTHH:MM:SS` optionally followed by `z<zone-id>`,
//! e.g. `2015-01-01T00:00:00`, `2015-01-01T00:00:00z UTC`,
//! `2015-01-01T00:00:00zAmerica/New_York`. The date-time prefix uses
//! fixed-width fields. Whether the zone identifier exists is not decided
//! here; the zone resolver asks the zone database.

use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::types::EvalError;

/// A parsed literal: a wall-clock reading plus its own zone, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLiteral {
    pub local: PrimitiveDateTime,
    pub zone: Option<String>,
}

/// Parse a timestamp literal.
pub fn parse_literal(literal: &str) -> Result<TimestampLiteral, EvalError> {
    let (stamp, zone) = match literal.split_once('z') {
        Some((stamp, zone)) => (stamp, Some(zone.trim())),
        None => (literal, None),
    };

    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let local = PrimitiveDateTime::parse(stamp.trim(), format)
        .map_err(|e| EvalError::invalid_timestamp(literal, e.to_string()))?;

    let zone = match zone {
        Some("") => {
            return Err(EvalError::invalid_timestamp(
                literal,
                "empty zone identifier after 'z'",
            ))
        }
        Some(id) => Some(id.to_string()),
        None => None,
    };

    Ok(TimestampLiteral { local, zone })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parse_without_zone() {
        let lit = parse_literal("2015-01-01T00:00:00").unwrap();
        assert_eq!(lit.local, datetime!(2015-01-01 00:00:00));
        assert_eq!(lit.zone, None);
    }

    #[test]
    fn parse_with_zone() {
        let lit = parse_literal("2015-06-30T23:59:59zAmerica/New_York").unwrap();
        assert_eq!(lit.local, datetime!(2015-06-30 23:59:59));
        assert_eq!(lit.zone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn parse_with_spaced_zone() {
        let lit = parse_literal("2015-01-01T02:00:00z UTC").unwrap();
        assert_eq!(lit.zone.as_deref(), Some("UTC"));
    }

    #[test]
    fn reject_short_fields() {
        let err = parse_literal("2015-1-1T00:00:00").unwrap_err();
        assert!(matches!(err, EvalError::InvalidTimestamp { .. }));
    }

    #[test]
    fn reject_out_of_range_fields() {
        assert!(parse_literal("2015-13-01T00:00:00").is_err());
        assert!(parse_literal("2015-02-30T00:00:00").is_err());
        assert!(parse_literal("2015-01-01T24:00:00").is_err());
    }

    #[test]
    fn reject_trailing_garbage_and_empty_zone() {
        assert!(parse_literal("2015-01-01T00:00:00+05:00").is_err());
        assert!(parse_literal("2015-01-01T00:00:00z").is_err());
        assert!(parse_literal("2015-01-01T00:00:00z   ").is_err());
        assert!(parse_literal("friday").is_err());
    }
}
