//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application:
//! best-effort amount parsing, date/time parsing for debt input and group
//! handle normalization.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

/// Date format accepted for due dates (`2025/12/20`)
pub const DUE_DATE_FORMAT: &str = "%Y/%m/%d";

/// Time format accepted for reminder times (`12:30`, 24h)
pub const REMIND_TIME_FORMAT: &str = "%H:%M";

/// Parse a free-text amount such as `100k` or `Rp 25.000` into a number.
///
/// `k`/`K` expand to `000`, every other non-digit except `.` is dropped and the
/// rest is parsed as a float. Anything unparseable counts as 0.
pub fn parse_amount(raw: &str) -> f64 {
    let expanded = raw.replace('k', "000").replace('K', "000");
    let cleaned: String = expanded
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Sum a list of free-text amounts, malformed entries contribute 0
pub fn sum_amounts<'a, I>(amounts: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    amounts.into_iter().map(parse_amount).sum()
}

/// Format an aggregate amount the short way (`1.5M`, `250k`, `900`)
pub fn format_amount_total(total: f64) -> String {
    if total >= 1_000_000.0 {
        format!("{:.1}M", total / 1_000_000.0)
    } else if total >= 1_000.0 {
        format!("{:.0}k", total / 1_000.0)
    } else {
        format!("{}", total as i64)
    }
}

/// Parse a due date in `YYYY/MM/DD` form
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).ok()
}

/// Parse a reminder time in `HH:MM` form
pub fn parse_remind_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), REMIND_TIME_FORMAT).ok()
}

/// Combine a due date and reminder time into one local due moment
pub fn combine_due_moment(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Normalize a group reference into the bare handle stored in the mandatory list.
///
/// Accepts `@name`, `name`, `t.me/name` and `https://t.me/name` (any case);
/// numeric chat ids such as `-1001234567890` are kept verbatim. Returns `None`
/// when nothing usable is left.
pub fn normalize_group_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.parse::<i64>().is_ok() {
        return Some(trimmed.to_string());
    }

    let candidate = if trimmed.contains("t.me/") || trimmed.contains("telegram.me/") {
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };
        let url = Url::parse(&with_scheme).ok()?;
        url.path_segments()?
            .find(|segment| !segment.is_empty())?
            .to_string()
    } else {
        trimmed.trim_start_matches('@').to_string()
    };

    let handle = candidate.trim_start_matches('@').to_lowercase();
    let valid = !handle.is_empty()
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Some(handle)
    } else {
        None
    }
}

/// Public join link for a stored group handle, if it has one
pub fn group_join_link(handle: &str) -> Option<Url> {
    if handle.parse::<i64>().is_ok() {
        return None;
    }
    Url::parse(&format!("https://t.me/{}", handle)).ok()
}

/// Display form of a stored group handle (`@name` or the raw chat id)
pub fn display_group(handle: &str) -> String {
    if handle.parse::<i64>().is_ok() {
        handle.to_string()
    } else {
        format!("@{}", handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100k"), 100_000.0);
        assert_eq!(parse_amount("Rp 25000"), 25_000.0);
        assert_eq!(parse_amount("2K"), 2_000.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("1.2.3"), 0.0);
    }

    #[test]
    fn test_sum_amounts_skips_malformed() {
        let total = sum_amounts(vec!["100k", "abc", "500"]);
        assert_eq!(total, 100_500.0);
    }

    #[test]
    fn test_format_amount_total() {
        assert_eq!(format_amount_total(1_500_000.0), "1.5M");
        assert_eq!(format_amount_total(250_000.0), "250k");
        assert_eq!(format_amount_total(900.0), "900");
        assert_eq!(format_amount_total(0.0), "0");
    }

    #[test]
    fn test_parse_due_date_and_time() {
        assert_eq!(parse_due_date("2025/12/20"), NaiveDate::from_ymd_opt(2025, 12, 20));
        assert_eq!(parse_due_date("2025-12-20"), None);
        assert_eq!(parse_remind_time("12:30"), NaiveTime::from_hms_opt(12, 30, 0));
        assert_eq!(parse_remind_time("25:00"), None);
    }

    #[test]
    fn test_normalize_group_handle() {
        assert_eq!(normalize_group_handle("@TestChannel"), Some("testchannel".to_string()));
        assert_eq!(normalize_group_handle("testchannel"), Some("testchannel".to_string()));
        assert_eq!(normalize_group_handle("https://t.me/Test_Channel"), Some("test_channel".to_string()));
        assert_eq!(normalize_group_handle("t.me/foo"), Some("foo".to_string()));
        assert_eq!(normalize_group_handle("-1001234567890"), Some("-1001234567890".to_string()));
        assert_eq!(normalize_group_handle("@"), None);
        assert_eq!(normalize_group_handle("not a group"), None);
    }

    #[test]
    fn test_group_links() {
        assert_eq!(group_join_link("foo").map(|u| u.to_string()), Some("https://t.me/foo".to_string()));
        assert!(group_join_link("-1001").is_none());
        assert_eq!(display_group("foo"), "@foo");
        assert_eq!(display_group("-1001"), "-1001");
    }

    proptest! {
        #[test]
        fn parse_amount_never_panics_and_is_non_negative(raw in ".*") {
            let value = parse_amount(&raw);
            prop_assert!(value >= 0.0);
        }

        #[test]
        fn parse_amount_reads_plain_integers(n in 0u32..1_000_000) {
            prop_assert_eq!(parse_amount(&n.to_string()), n as f64);
        }
    }
}
