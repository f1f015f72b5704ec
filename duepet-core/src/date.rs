//! Date parsing and calendar range helpers
//!
//! Supports:
//! - Strict ISO dates for stored fields: "2026-01-25"
//! - Human input for the CLI: "today", "tomorrow", "monday", "next friday",
//!   "in 3 days", "Jan 25", "25 January 2026"
//! - Fuzzy extraction for imported due-date text, which usually carries
//!   extra words around the actual date

use std::sync::LazyLock;

use chrono::{Datelike, Days, Local, Months, NaiveDate, TimeZone, Weekday};
use chrono_english::{Dialect, parse_date_string};
use regex::Regex;

use crate::error::{CoreError, Result};

/// Format used for every stored date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// 2025-05-30, 2025/5/30, 2025.05.30
static NUMERIC_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})")
        .expect("Invalid numeric date regex - this is a compile-time constant")
});

// 2025年5月30日
static CJK_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日")
        .expect("Invalid CJK date regex - this is a compile-time constant")
});

// 11:59 PM, 23:59, 11:59:00 p.m.
static CLOCK_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\b\.?)?")
        .expect("Invalid clock time regex - this is a compile-time constant")
});

static WEEKDAY_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|wed|thu|fri|sat|sun)\b\.?,?",
    )
    .expect("Invalid weekday regex - this is a compile-time constant")
});

/// Parse a stored date. Only `YYYY-MM-DD` is accepted.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::invalid_date(input))
}

/// Parse a human-entered date relative to `today`
///
/// Supports multiple formats:
/// - ISO: "2026-01-25"
/// - Human: "Jan 25", "January 25", "Jan 25 2026", "25 Jan 2026"
/// - Relative: "today", "tomorrow", "yesterday"
/// - Weekdays: "monday", "tuesday", etc. (next occurrence)
/// - Prefixed: "next monday", "next friday"
/// - Offset: "in 3 days", "in 1 week", "in 2 weeks"
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim().to_lowercase();

    if let Some(date) = try_parse_relative(&input, today) {
        return Ok(date);
    }

    if let Some(date) = try_parse_weekday(&input, today) {
        return Ok(date);
    }

    if let Some(date) = try_parse_offset(&input, today) {
        return Ok(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&input, DATE_FORMAT) {
        return Ok(date);
    }

    let with_year = [
        "%b %d %Y", // Jan 25 2026
        "%B %d %Y", // January 25 2026
        "%b %d, %Y", // Jan 25, 2026
        "%B %d, %Y", // January 25, 2026
        "%m/%d/%Y", // 01/25/2026
        "%d %b %Y", // 25 Jan 2026
        "%d %B %Y", // 25 January 2026
    ];

    for format in &with_year {
        if let Ok(date) = NaiveDate::parse_from_str(&input, format) {
            return Ok(date);
        }
    }

    // Year-less forms: assume this year, or next year if already past
    let without_year = ["%b %d", "%B %d", "%m/%d"];
    for format in &without_year {
        let dated = format!("{} {}", input, today.year());
        let format = format!("{} %Y", format);
        if let Ok(date) = NaiveDate::parse_from_str(&dated, &format) {
            if date < today {
                return date
                    .with_year(today.year() + 1)
                    .ok_or_else(|| CoreError::invalid_date(&input));
            }
            return Ok(date);
        }
    }

    Err(CoreError::parse(format!(
        "Could not parse date '{}'. Try formats like: 'tomorrow', 'Jan 25', '2026-01-25', 'next monday', 'in 3 days'",
        input
    )))
}

/// Best-effort extraction of a date from free-form text.
///
/// Returns `None` when nothing date-like can be found; callers decide the
/// fallback.
pub fn parse_fuzzy_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    for regex in [&*NUMERIC_DATE_REGEX, &*CJK_DATE_REGEX] {
        if let Some(caps) = regex.captures(text) {
            let year = caps.get(1)?.as_str().parse().ok()?;
            let month = caps.get(2)?.as_str().parse().ok()?;
            let day = caps.get(3)?.as_str().parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    if let Ok(date) = parse_date(text, today) {
        return Some(date);
    }

    // The time of day never decides the date. A weekday name next to a full
    // date is redundant, and alone it would resolve to the next occurrence.
    let mut cleaned = CLOCK_TIME_REGEX.replace_all(text, " ").into_owned();
    if cleaned.chars().any(|c| c.is_ascii_digit()) {
        cleaned = WEEKDAY_NAME_REGEX.replace_all(&cleaned, " ").into_owned();
    }

    // Longest run of words first, so "Due: May 30, 2025" settles on
    // "May 30, 2025" before any shorter fragment
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    for len in (1..=words.len()).rev() {
        for window in words.windows(len) {
            let candidate = window.join(" ");
            if let Some(date) = parse_candidate(&candidate, today) {
                return Some(date);
            }
        }
    }

    None
}

fn parse_candidate(candidate: &str, today: NaiveDate) -> Option<NaiveDate> {
    let candidate = candidate.trim_matches(|c: char| matches!(c, ':' | ',' | '.' | ';'));
    if candidate.is_empty() {
        return None;
    }
    parse_date(candidate, today)
        .ok()
        .or_else(|| parse_english(candidate, today))
}

fn parse_english(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let anchor = today.and_hms_opt(12, 0, 0)?;
    let anchor = Local.from_local_datetime(&anchor).earliest()?;
    parse_date_string(input, anchor, Dialect::Us)
        .ok()
        .map(|dt| dt.date_naive())
}

fn try_parse_relative(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    match input {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        _ => None,
    }
}

fn try_parse_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let weekday_str = input.strip_prefix("next ").unwrap_or(input);
    let target = parse_weekday(weekday_str)?;

    // Always the next occurrence, a week ahead when it is today
    let days = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    let days_until = if days == 0 { 7 } else { days as u64 };

    today.checked_add_days(Days::new(days_until))
}

fn try_parse_offset(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let rest = input.strip_prefix("in ")?.trim();
    let parts: Vec<&str> = rest.split_whitespace().collect();

    if parts.len() != 2 {
        return None;
    }

    let num: u64 = parts[0].parse().ok()?;

    match parts[1] {
        "day" | "days" => today.checked_add_days(Days::new(num)),
        "week" | "weeks" => today.checked_add_days(Days::new(num * 7)),
        _ => None,
    }
}

/// Parse a weekday name or abbreviation
pub fn parse_weekday(input: &str) -> Option<Weekday> {
    match input.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Inclusive 7-day range of the week containing `today`
pub fn week_range(today: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let week = today.week(week_start);
    (week.first_day(), week.last_day())
}

/// Inclusive range of the calendar month containing `today`
pub fn month_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (first, last)
}

/// Format a NaiveDate for human-readable display
///
/// Returns strings like: "Today", "Tomorrow", "Mon Jan 27", "Overdue (3 days ago)"
pub fn format_date_human(date: NaiveDate, today: NaiveDate) -> String {
    let diff = date.signed_duration_since(today).num_days();

    match diff {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        2..=6 => date.format("%a %b %d").to_string(),
        7..=365 => date.format("%b %d").to_string(),
        _ if diff < 0 => format!("Overdue ({} days ago)", -diff),
        _ => date.format(DATE_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2026-01-25").unwrap(), day(2026, 1, 25));
        assert!(matches!(
            parse_iso_date("2025-13-40"),
            Err(CoreError::InvalidDate { .. })
        ));
        assert!(parse_iso_date("tomorrow").is_err());
    }

    #[test]
    fn test_parse_today_tomorrow() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Tomorrow", today).unwrap(), day(2025, 4, 17));
    }

    #[test]
    fn test_parse_weekday() {
        // 2025-04-16 is a Wednesday
        let today = day(2025, 4, 16);
        assert_eq!(parse_date("friday", today).unwrap(), day(2025, 4, 18));
        assert_eq!(parse_date("next wednesday", today).unwrap(), day(2025, 4, 23));
    }

    #[test]
    fn test_parse_offset() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_date("in 3 days", today).unwrap(), day(2025, 4, 19));
        assert_eq!(parse_date("in 2 weeks", today).unwrap(), day(2025, 4, 30));
    }

    #[test]
    fn test_parse_yearless_rolls_forward() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_date("Jan 25", today).unwrap(), day(2026, 1, 25));
        assert_eq!(parse_date("May 2", today).unwrap(), day(2025, 5, 2));
    }

    #[test]
    fn test_fuzzy_numeric_with_noise() {
        let today = day(2025, 4, 16);
        assert_eq!(
            parse_fuzzy_date("Due: 2025-05-30 23:59", today),
            Some(day(2025, 5, 30))
        );
        assert_eq!(
            parse_fuzzy_date("截止日期 2025年5月30日 星期五 下午11时59分", today),
            Some(day(2025, 5, 30))
        );
    }

    #[test]
    fn test_fuzzy_english_with_trailing_time() {
        let today = day(2025, 4, 16);
        let expected = Some(day(2025, 5, 30));
        assert_eq!(parse_fuzzy_date("Due: May 30, 2025 11:59 PM", today), expected);
        assert_eq!(
            parse_fuzzy_date("Friday, May 30, 2025 11:59:00 PM", today),
            expected
        );
        assert_eq!(parse_fuzzy_date("05/30/2025 11:59 PM", today), expected);
    }

    #[test]
    fn test_fuzzy_weekday_alone_is_next_occurrence() {
        let today = day(2025, 4, 16);
        assert_eq!(
            parse_fuzzy_date("Due Friday 11:59 PM", today),
            Some(day(2025, 4, 18))
        );
    }

    #[test]
    fn test_fuzzy_gives_up_on_nonsense() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_fuzzy_date("whenever you like", today), None);
        assert_eq!(parse_fuzzy_date("   ", today), None);
    }

    #[test]
    fn test_week_range_monday_start() {
        let (start, end) = week_range(day(2025, 4, 16), Weekday::Mon);
        assert_eq!(start, day(2025, 4, 14));
        assert_eq!(end, day(2025, 4, 20));

        let (start, end) = week_range(day(2025, 4, 14), Weekday::Mon);
        assert_eq!(start, day(2025, 4, 14));
        assert_eq!(end, day(2025, 4, 20));
    }

    #[test]
    fn test_week_range_sunday_start() {
        let (start, end) = week_range(day(2025, 4, 16), Weekday::Sun);
        assert_eq!(start, day(2025, 4, 13));
        assert_eq!(end, day(2025, 4, 19));
    }

    #[test]
    fn test_month_range() {
        assert_eq!(
            month_range(day(2025, 12, 9)),
            (day(2025, 12, 1), day(2025, 12, 31))
        );
        assert_eq!(
            month_range(day(2024, 2, 29)),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
    }

    #[test]
    fn test_format_date_human() {
        let today = day(2025, 4, 16);
        assert_eq!(format_date_human(today, today), "Today");
        assert_eq!(format_date_human(day(2025, 4, 17), today), "Tomorrow");
        assert_eq!(format_date_human(day(2025, 4, 15), today), "Yesterday");
        assert_eq!(
            format_date_human(day(2025, 4, 10), today),
            "Overdue (6 days ago)"
        );
    }
}
