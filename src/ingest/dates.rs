//! Broker date parsing
//!
//! Flex queries, activity statements and gateway payloads all disagree on
//! date layout. Everything funnels through [`parse_trade_datetime`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// `19JUL24` / `19JUL2024` embedded in an option description
static DESCRIPTION_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})([A-Z]{3})(\d{2,4})\b").expect("static regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Epoch date used for unparseable dates in lenient mode
pub fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parse a broker date, optionally carrying a time component
pub fn parse_trade_datetime(raw: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("N/A") {
        return None;
    }

    // 20240719;153000
    if let Some((date, time)) = raw.split_once(';') {
        let date = parse_compact_date(date.trim())?;
        return Some((date, parse_time(time)));
    }

    // 2024-06-20 095124 and 20240620 095124
    if let Some((date, time)) = raw.split_once(' ') {
        let time = time.trim();
        if time.len() == 6 && time.bytes().all(|b| b.is_ascii_digit()) {
            let date = parse_date_only(date.trim())?;
            return Some((date, parse_time(time)));
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some((dt.date(), Some(dt.time())));
        }
    }

    parse_date_only(raw).map(|date| (date, None))
}

fn parse_date_only(raw: &str) -> Option<NaiveDate> {
    if let Some(date) = parse_compact_date(raw) {
        return Some(date);
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// `YYYYMMDD`
fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = raw[0..4].parse().ok()?;
    let month = raw[4..6].parse().ok()?;
    let day = raw[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `HH:MM:SS`, `HH:MM` or `HHMMSS`
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let hour = raw[0..2].parse().ok()?;
        let minute = raw[2..4].parse().ok()?;
        let second = raw[4..6].parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, second);
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Recover a trade date from a description such as `SPY 19JUL24 540 P`
pub fn date_from_description(description: &str) -> Option<NaiveDate> {
    let captures = DESCRIPTION_DATE.captures(description)?;
    let day: u32 = captures[1].parse().ok()?;
    let month = month_number(&captures[2])?;
    let year: i32 = match &captures[3] {
        y if y.len() == 2 => 2000 + y.parse::<i32>().ok()?,
        y if y.len() == 4 => y.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date_formats() {
        assert_eq!(parse_trade_datetime("20240719"), Some((ymd(2024, 7, 19), None)));
        assert_eq!(parse_trade_datetime("2024-07-19"), Some((ymd(2024, 7, 19), None)));
        assert_eq!(parse_trade_datetime("19/07/2024"), Some((ymd(2024, 7, 19), None)));
    }

    #[test]
    fn test_date_with_time_formats() {
        let expected_time = NaiveTime::from_hms_opt(9, 51, 24);
        assert_eq!(
            parse_trade_datetime("2024-06-20 09:51:24"),
            Some((ymd(2024, 6, 20), expected_time))
        );
        assert_eq!(
            parse_trade_datetime("2024-06-20 095124"),
            Some((ymd(2024, 6, 20), expected_time))
        );
        assert_eq!(
            parse_trade_datetime("20240620;095124"),
            Some((ymd(2024, 6, 20), expected_time))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_trade_datetime(""), None);
        assert_eq!(parse_trade_datetime("N/A"), None);
        assert_eq!(parse_trade_datetime("yesterday"), None);
        assert_eq!(parse_trade_datetime("20241345"), None);
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(date_from_description("SPY 19JUL24 540 P"), Some(ymd(2024, 7, 19)));
        assert_eq!(date_from_description("QQQ 3JAN2025 500 C"), Some(ymd(2025, 1, 3)));
        assert_eq!(date_from_description("no date here"), None);
    }

    #[test]
    fn test_epoch_date() {
        assert_eq!(epoch_date(), ymd(1970, 1, 1));
    }
}
