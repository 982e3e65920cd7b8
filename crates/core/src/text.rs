//! Text helpers shared by the page controllers and render helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Split a single "full name" input into first and last name.
///
/// The first whitespace-delimited token is the first name; everything after
/// it is the last name.
///
/// ```
/// use shopfront_core::text::split_full_name;
///
/// assert_eq!(split_full_name("Ada Lovelace"), ("Ada".into(), "Lovelace".into()));
/// assert_eq!(split_full_name("Madonna"), ("Madonna".into(), String::new()));
/// ```
#[must_use]
pub fn split_full_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_owned(), rest.trim_start().to_owned()),
        None => (trimmed.to_owned(), String::new()),
    }
}

/// Collapse a product name that the catalog service duplicated.
///
/// Some cart lines come back with their name repeated ("Red Red T-Shirt Red
/// Red T-Shirt"). When the first word makes up more than half of all words,
/// only the first half of the words is kept.
///
/// ```
/// use shopfront_core::text::dedupe_repeated_name;
///
/// assert_eq!(dedupe_repeated_name("Red Red T-Shirt Red Red T-Shirt"), "Red Red T-Shirt");
/// assert_eq!(dedupe_repeated_name("Blue Jeans"), "Blue Jeans");
/// ```
#[must_use]
pub fn dedupe_repeated_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let Some(first) = words.first() else {
        return String::new();
    };

    let repeats = words.iter().filter(|w| *w == first).count();
    if words.len() >= 2 && repeats * 2 > words.len() {
        words
            .iter()
            .take(words.len() / 2)
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        words.join(" ")
    }
}

/// Uppercase the first character, leave the rest untouched.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map_or_else(String::new, |c| c.to_uppercase().chain(chars).collect())
}

/// Parse the timestamp formats the API emits.
///
/// Accepts RFC 3339, naive ISO-8601 (`2024-03-01T12:30:00` with optional
/// fraction), RFC 2822 (`Fri, 01 Mar 2024 12:30:00 GMT`) and bare dates.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.naive_utc()))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a timestamp as a short date (`3/1/2024`).
#[must_use]
pub fn format_date(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| dt.format("%-m/%-d/%Y").to_string())
}

/// Format a timestamp as date and time (`3/1/2024, 12:30:00 PM`).
#[must_use]
pub fn format_datetime(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_full_name() {
        assert_eq!(
            split_full_name("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_full_name("Madonna"),
            ("Madonna".to_string(), String::new())
        );
        assert_eq!(
            split_full_name("  Jean Luc Picard "),
            ("Jean".to_string(), "Luc Picard".to_string())
        );
    }

    #[test]
    fn test_dedupe_repeated_name() {
        assert_eq!(
            dedupe_repeated_name("Red Red T-Shirt Red Red T-Shirt"),
            "Red Red T-Shirt"
        );
        assert_eq!(dedupe_repeated_name("Red Red"), "Red");
    }

    #[test]
    fn test_dedupe_leaves_normal_names() {
        assert_eq!(dedupe_repeated_name("Red T-Shirt"), "Red T-Shirt");
        assert_eq!(dedupe_repeated_name("Socks"), "Socks");
        assert_eq!(dedupe_repeated_name("Red Blue Red Green"), "Red Blue Red Green");
        assert_eq!(dedupe_repeated_name(""), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("customer"), "Customer");
        assert_eq!(capitalize("Admin"), "Admin");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(format_date("2024-03-01T12:30:00").as_deref(), Some("3/1/2024"));
        assert_eq!(
            format_date("2024-03-01T12:30:00.123456").as_deref(),
            Some("3/1/2024")
        );
        assert_eq!(
            format_date("Fri, 01 Mar 2024 12:30:00 GMT").as_deref(),
            Some("3/1/2024")
        );
        assert_eq!(
            format_datetime("2024-03-01T15:04:05Z").as_deref(),
            Some("3/1/2024, 3:04:05 PM")
        );
        assert_eq!(format_date("2024-12-25").as_deref(), Some("12/25/2024"));
        assert!(format_date("yesterday").is_none());
    }
}
