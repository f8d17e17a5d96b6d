//! Calendar date parsing for ingested rows
//!
//! Accepts the unambiguous ways a day is commonly written in exported
//! spreadsheets. Anything with a time component is truncated to its date.
//! Numeric forms where day and month could be swapped (`01/02/2013`) are
//! rejected rather than guessed.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-only formats tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
];

/// Date-time formats tried after the RFC 3339 parser
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Literal values meaning "no end date" in an end-date column
const OPEN_END_PLACEHOLDERS: &[&str] = &["undefined", "null"];

/// Parse a calendar date, returning `None` if the text is not a concrete day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use collab_common::dates::parse_calendar_date;
///
/// let day = NaiveDate::from_ymd_opt(2013, 11, 1).unwrap();
/// assert_eq!(parse_calendar_date("2013-11-01"), Some(day));
/// assert_eq!(parse_calendar_date("Nov 1, 2013"), Some(day));
/// assert_eq!(parse_calendar_date("2013-11-01T08:30:00Z"), Some(day));
/// assert_eq!(parse_calendar_date("01/11/2013"), None);
/// ```
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_compact(text) {
        return Some(date);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
}

/// True when an end-date cell means the assignment is still running
pub fn is_open_end(input: &str) -> bool {
    let text = input.trim();
    text.is_empty()
        || OPEN_END_PLACEHOLDERS
            .iter()
            .any(|placeholder| text.eq_ignore_ascii_case(placeholder))
}

/// Whole days from `start` to `end`, counting both boundary days.
///
/// Returns 0 when `end` is before `start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    end.signed_duration_since(start).num_days() + 1
}

/// `YYYYMMDD`
fn parse_compact(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_and_separator_variants() {
        assert_eq!(parse_calendar_date("2013-11-01"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("2013/11/01"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("2013.11.01"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("20131101"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("  2009-01-01 "), Some(ymd(2009, 1, 1)));
    }

    #[test]
    fn test_month_name_variants() {
        assert_eq!(parse_calendar_date("1 November 2013"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("November 1, 2013"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("Nov 1, 2013"), Some(ymd(2013, 11, 1)));
        assert_eq!(parse_calendar_date("01-Nov-2013"), Some(ymd(2013, 11, 1)));
    }

    #[test]
    fn test_datetime_truncates_to_date() {
        assert_eq!(parse_calendar_date("2014-01-05T23:59:59Z"), Some(ymd(2014, 1, 5)));
        assert_eq!(parse_calendar_date("2014-01-05T10:00:00+02:00"), Some(ymd(2014, 1, 5)));
        assert_eq!(parse_calendar_date("2014-01-05 10:15:00"), Some(ymd(2014, 1, 5)));
        assert_eq!(parse_calendar_date("2014-01-05T10:15"), Some(ymd(2014, 1, 5)));
    }

    #[test]
    fn test_rejects_garbage_and_impossible_days() {
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("not-a-date"), None);
        assert_eq!(parse_calendar_date("2013-02-30"), None);
        assert_eq!(parse_calendar_date("20131301"), None);
    }

    #[test]
    fn test_rejects_ambiguous_numeric_forms() {
        assert_eq!(parse_calendar_date("01/11/2013"), None);
        assert_eq!(parse_calendar_date("11-01-2013"), None);
    }

    #[test]
    fn test_open_end_placeholders() {
        assert!(is_open_end(""));
        assert!(is_open_end("   "));
        assert!(is_open_end("undefined"));
        assert!(is_open_end("NULL"));
        assert!(is_open_end("null"));
        assert!(!is_open_end("2014-01-05"));
        assert!(!is_open_end("none"));
    }

    #[test]
    fn test_inclusive_days() {
        // Same day counts as one day
        assert_eq!(inclusive_days(ymd(2013, 11, 1), ymd(2013, 11, 1)), 1);
        assert_eq!(inclusive_days(ymd(2013, 11, 1), ymd(2013, 12, 1)), 31);
        assert_eq!(inclusive_days(ymd(2022, 3, 1), ymd(2022, 6, 30)), 122);
        assert_eq!(inclusive_days(ymd(2013, 12, 1), ymd(2013, 11, 1)), 0);
    }
}
