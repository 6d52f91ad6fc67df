//! Calendar date helpers.
//!
//! Polars stores `Date` values as days since the Unix epoch; these helpers
//! convert between that representation and `chrono::NaiveDate`, and parse the
//! handful of textual date layouts found in the county source files.

use chrono::{DateTime, NaiveDate};

// NaiveDate::default() is 1970-01-01.
fn unix_epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Days since 1970-01-01 for a calendar date.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(unix_epoch()).num_days() as i32
}

/// Calendar date for a days-since-epoch value.
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}

/// Parses a textual date.
///
/// Accepted layouts: `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `MM/DD/YY`,
/// `MM-DD-YYYY`, `DD-Mon-YYYY`, `Month DD, YYYY`, and any of those followed
/// by a time component (`2024-01-15T08:30:00Z`, `1/15/2024 12:00:00 AM`).
///
/// # Examples
///
/// ```
/// use bhd_common::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
/// assert_eq!(parse_date("2024-01-15"), expected);
/// assert_eq!(parse_date("1/15/2024 12:00:00 AM"), expected);
/// assert_eq!(parse_date("not a date"), None);
/// ```
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = parse_date_only(trimmed) {
        return Some(date);
    }
    for format in ["%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    let head = trimmed.split(['T', ' ']).next().unwrap_or_default();
    if head.len() < trimmed.len() {
        return parse_date_only(head);
    }
    None
}

fn parse_date_only(value: &str) -> Option<NaiveDate> {
    if let Some(date) = split_numeric(value, '-') {
        return Some(date);
    }
    if let Some(date) = split_numeric(value, '/') {
        return Some(date);
    }
    NaiveDate::parse_from_str(value, "%d-%b-%Y").ok()
}

/// Year-first when the first part has four digits, month-first otherwise.
fn split_numeric(value: &str, separator: char) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split(separator).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    if !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let nums: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    if nums.len() != 3 {
        return None;
    }
    let (year, month, day) = if parts[0].len() == 4 {
        (nums[0] as i32, nums[1], nums[2])
    } else {
        let year = match parts[2].len() {
            2 if nums[2] < 69 => 2000 + nums[2] as i32,
            2 => 1900 + nums[2] as i32,
            4 => nums[2] as i32,
            _ => return None,
        };
        (year, nums[0], nums[1])
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
