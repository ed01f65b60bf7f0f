//! Normalization of human-entered durations, dates, and timestamps.
//!
//! Trip logs carry durations as `HH:MM:SS` or `HH:MM:SS.ffffff` text and
//! dates in whatever format the operator typed. Everything funnels into
//! fractional minutes and `chrono` naive dates here; bad input degrades to
//! an explicit default instead of failing the run.

use chrono::{NaiveDate, NaiveDateTime};

/// Why a duration fell back to zero minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// The field was absent or blank.
    Missing,
    /// The field held text that is not a wall-clock duration.
    Unparseable,
}

/// Outcome of a duration parse.
///
/// Callers that only need a number read [`MinutesValue::minutes`], which
/// yields 0.0 for a default; callers that care about data quality can match
/// on the variant and log the reason.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinutesValue {
    Parsed(f64),
    Defaulted(DefaultReason),
}

impl MinutesValue {
    /// Total minutes, 0.0 when the input could not be parsed.
    pub fn minutes(&self) -> f64 {
        match self {
            MinutesValue::Parsed(m) => *m,
            MinutesValue::Defaulted(_) => 0.0,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, MinutesValue::Defaulted(_))
    }
}

/// Converts a wall-clock duration to fractional minutes.
///
/// Accepts `HH:MM:SS` and `HH:MM:SS.ffffff`; the result is
/// `hour * 60 + minute + second / 60` with fractional seconds folded into
/// the seconds component. Missing input defaults with
/// [`DefaultReason::Missing`], anything unrecognizable with
/// [`DefaultReason::Unparseable`].
pub fn parse_minutes(raw: Option<&str>) -> MinutesValue {
    let text = match raw {
        Some(t) => t.trim(),
        None => return MinutesValue::Defaulted(DefaultReason::Missing),
    };
    if text.is_empty() {
        return MinutesValue::Defaulted(DefaultReason::Missing);
    }

    match parse_hms(text) {
        Some((hour, minute, second)) => {
            MinutesValue::Parsed(hour as f64 * 60.0 + minute as f64 + second / 60.0)
        }
        None => MinutesValue::Defaulted(DefaultReason::Unparseable),
    }
}

fn parse_hms(text: &str) -> Option<(u32, u32, f64)> {
    let mut parts = text.splitn(3, ':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    let second: f64 = parts.next()?.trim().parse().ok()?;

    if minute >= 60 || !(0.0..60.0).contains(&second) {
        return None;
    }
    Some((hour, minute, second))
}

/// Date-only formats accepted for human-entered dates, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d-%b-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Date-and-time formats accepted for trip timestamps, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
];

/// Parses a human-entered date into a canonical [`NaiveDate`].
///
/// Returns `None` for unparseable input; output is rendered as `YYYY-MM-DD`
/// wherever dates appear in reports.
pub fn canonical_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    // Date-and-time entries still carry a usable calendar date.
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts.date());
        }
    }

    None
}

/// Parses a trip timestamp, accepting the datetime formats first and
/// falling back to a bare date at midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }

    canonical_date(text).and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_with_fractional_seconds() {
        let value = parse_minutes(Some("01:02:03.5"));
        let expected = 62.0 + 3.5 / 60.0;
        match value {
            MinutesValue::Parsed(m) => assert!((m - expected).abs() < 1e-9),
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_minutes_whole_seconds() {
        assert_eq!(
            parse_minutes(Some("02:30:00")),
            MinutesValue::Parsed(150.0)
        );
    }

    #[test]
    fn test_parse_minutes_missing() {
        assert_eq!(
            parse_minutes(None),
            MinutesValue::Defaulted(DefaultReason::Missing)
        );
        assert_eq!(
            parse_minutes(Some("   ")),
            MinutesValue::Defaulted(DefaultReason::Missing)
        );
        assert_eq!(parse_minutes(None).minutes(), 0.0);
    }

    #[test]
    fn test_parse_minutes_garbage() {
        assert_eq!(
            parse_minutes(Some("Mileage")),
            MinutesValue::Defaulted(DefaultReason::Unparseable)
        );
        assert_eq!(
            parse_minutes(Some("12:99:00")),
            MinutesValue::Defaulted(DefaultReason::Unparseable)
        );
        assert_eq!(parse_minutes(Some("not a time")).minutes(), 0.0);
    }

    #[test]
    fn test_canonical_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 11, 7).unwrap();
        assert_eq!(canonical_date("2023-11-07"), Some(expected));
        assert_eq!(canonical_date("11/07/2023"), Some(expected));
        assert_eq!(canonical_date("07-Nov-2023"), Some(expected));
        assert_eq!(canonical_date("November 7, 2023"), Some(expected));
        assert_eq!(canonical_date("2023-11-07 08:15:00"), Some(expected));
    }

    #[test]
    fn test_canonical_date_unparseable() {
        assert_eq!(canonical_date("Total for Day"), None);
        assert_eq!(canonical_date(""), None);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let ts = parse_timestamp("2023-11-07 08:15:30").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2023-11-07 08:15:30");

        let from_date_only = parse_timestamp("11/07/2023").unwrap();
        assert_eq!(
            from_date_only,
            NaiveDate::from_ymd_opt(2023, 11, 7)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        assert_eq!(parse_timestamp("yesterday-ish"), None);
    }
}
