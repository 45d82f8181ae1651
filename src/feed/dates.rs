//! Publish-date normalization for feed items.
//!
//! Feed publishers never declare which date format they used, so a raw date
//! string is classified by successful parse: each candidate layout is tried
//! in a fixed order and the first one that parses wins. The result is always
//! converted to UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// No layout in [`LAYOUTS`] matched the input string.
#[derive(Debug, Error)]
#[error("unrecognized date format '{raw}'")]
pub struct DateParseError {
    /// The original, unmodified input.
    pub raw: String,
    /// The parse error from the last layout tried.
    #[source]
    pub source: Option<chrono::ParseError>,
}

enum Layout {
    /// RFC 822 / RSS family via the RFC 2822 parser: optional weekday,
    /// zero-padded or bare day-of-month, named zones (GMT, EST, ...) and
    /// numeric ±HHMM offsets.
    Rfc2822,
    /// RFC 3339 / Atom: 'T' separator, optional fractional seconds, 'Z' or
    /// ±HH:MM offset.
    Rfc3339,
    /// A `chrono` format string with an explicit offset specifier.
    WithOffset(&'static str),
    /// A `chrono` format string with no offset; the value is taken as UTC.
    AssumeUtc(&'static str),
}

/// Candidate layouts, tried in order. First successful parse wins.
const LAYOUTS: &[Layout] = &[
    Layout::Rfc2822,
    Layout::Rfc3339,
    // ISO-style with a non-colon offset, which strict RFC 3339 rejects
    Layout::WithOffset("%Y-%m-%dT%H:%M:%S%.f%z"),
    // Rare: space instead of the 'T' separator
    Layout::WithOffset("%Y-%m-%d %H:%M:%S%.f%z"),
    Layout::AssumeUtc("%Y-%m-%d %H:%M:%S%.fZ"),
    Layout::AssumeUtc("%Y-%m-%d %H:%M:%S%.f"),
];

/// Parses a free-form feed date string into a UTC timestamp.
///
/// # Errors
///
/// Returns [`DateParseError`] carrying the original string and the last
/// underlying parse error when no known layout matches.
pub fn normalize(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let input = raw.trim();
    let mut last_err = None;

    for layout in LAYOUTS {
        let parsed = match layout {
            Layout::Rfc2822 => DateTime::parse_from_rfc2822(input),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(input),
            Layout::WithOffset(fmt) => DateTime::parse_from_str(input, fmt),
            Layout::AssumeUtc(fmt) => match NaiveDateTime::parse_from_str(input, fmt) {
                Ok(naive) => return Ok(naive.and_utc()),
                Err(e) => Err(e),
            },
        };
        match parsed {
            Ok(dt) => return Ok(dt.with_timezone(&Utc)),
            Err(e) => last_err = Some(e),
        }
    }

    Err(DateParseError {
        raw: raw.to_string(),
        source: last_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc822_named_zone() {
        let dt = normalize("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_rfc822_numeric_offset() {
        let dt = normalize("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 22, 4, 5));
    }

    #[test]
    fn test_rfc822_est_converts_to_utc() {
        let dt = normalize("Mon, 02 Jan 2006 15:04:05 EST").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 20, 4, 5));
    }

    #[test]
    fn test_rfc822_without_weekday() {
        let dt = normalize("02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_rfc822_bare_day_of_month() {
        let dt = normalize("Mon, 2 Jan 2006 15:04:05 +0000").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_rfc3339_zulu() {
        let dt = normalize("2006-01-02T15:04:05Z").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_rfc3339_fractional_seconds_with_offset() {
        let dt = normalize("2006-01-02T15:04:05.999+02:00").unwrap();
        assert_eq!(dt.timestamp(), utc(2006, 1, 2, 13, 4, 5).timestamp());
        assert_eq!(dt.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn test_space_separator_with_offset() {
        let dt = normalize("2006-01-02 15:04:05+00:00").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_space_separator_zulu() {
        let dt = normalize("2006-01-02 15:04:05Z").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        let dt = normalize("  2006-01-02T15:04:05Z\n").unwrap();
        assert_eq!(dt, utc(2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_unrecognized_string_fails() {
        let err = normalize("not a date").unwrap_err();
        assert_eq!(err.raw, "not a date");
        assert!(err.source.is_some());
        assert!(err.to_string().contains("not a date"));
    }

    #[test]
    fn test_empty_string_fails() {
        assert!(normalize("").is_err());
    }
}
