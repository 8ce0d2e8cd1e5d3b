//! ISO-8601 timestamp helpers.
//!
//! Records carry their timestamps as RFC 3339 strings because that is the
//! remote wire format. Conflict resolution only ever needs a total order,
//! so parsing collapses to milliseconds since the Unix epoch, with anything
//! unparseable treated as the epoch itself (always "older").

use chrono::{DateTime, SecondsFormat, Utc};

/// Returns the current UTC time as an RFC 3339 string.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp into milliseconds since the Unix epoch.
///
/// An empty, missing, or malformed timestamp parses as 0 so that a record
/// without a usable `updatedAt` always loses a newer-wins comparison.
#[must_use]
pub fn parse_iso_millis(value: &str) -> i64 {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_timestamp() {
        assert_eq!(parse_iso_millis("1970-01-01T00:00:01Z"), 1_000);
    }

    #[test]
    fn parse_garbage_is_epoch() {
        assert_eq!(parse_iso_millis("not a timestamp"), 0);
        assert_eq!(parse_iso_millis(""), 0);
    }

    #[test]
    fn now_round_trips() {
        let now = now_iso();
        assert!(parse_iso_millis(&now) > 0);
    }

    #[test]
    fn ordering_matches_string_semantics() {
        let a = parse_iso_millis("2024-01-01T00:00:00Z");
        let b = parse_iso_millis("2024-01-02T00:00:00Z");
        assert!(b > a);
    }
}
