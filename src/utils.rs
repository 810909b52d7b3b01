use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%m/%d/%y",
    "%m-%d-%y",
];

/// `%Y` also accepts two-digit years such as "24"; anything earlier than this is rejected.
const MIN_YEAR: i32 = 1000;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses the date portion of a statement date or timestamp.
/// Accepts ISO dates, US-style dates, RFC 3339 timestamps and naive timestamps.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let plausible = |date: NaiveDate| date.year() >= MIN_YEAR;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive()).filter(|d| plausible(*d));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date()).filter(|d| plausible(*d));
        }
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .filter(|d| plausible(*d))
    })
}

/// Strips everything except digits, `.` and `-`, then parses what is left.
/// Returns `None` when the remainder is empty or not a finite number.
pub fn parse_stripped_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Formats a monetary figure as whole dollars with thousands separators, e.g. `$1,250,000`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}", sign, grouped)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Serde adapter for dates that may arrive as plain dates or as full timestamps.
pub mod flexible_date {
    use super::parse_flexible_date;
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_flexible_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_flexible_date("2024-03-15"), Some(expected));
        assert_eq!(parse_flexible_date("03/15/2024"), Some(expected));
        assert_eq!(parse_flexible_date("2024-03-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_flexible_date("2024-03-15T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_flexible_date("2024-03-15 08:00:00"), Some(expected));
        assert_eq!(parse_flexible_date("not a date"), None);
        assert_eq!(parse_flexible_date(""), None);
    }

    #[test]
    fn test_two_digit_years() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_flexible_date("01/15/24"), Some(expected));
        assert_eq!(parse_flexible_date("01-15-24"), Some(expected));
        assert_eq!(parse_flexible_date("01/15/2024"), Some(expected));
        assert_eq!(parse_flexible_date("0024-01-15"), None);
    }

    #[test]
    fn test_parse_stripped_amount() {
        assert_eq!(parse_stripped_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_stripped_amount("-500.00 USD"), Some(-500.0));
        assert_eq!(parse_stripped_amount("abc"), None);
        assert_eq!(parse_stripped_amount(""), None);
        assert_eq!(parse_stripped_amount("1.2.3"), None);
    }

    #[test]
    fn test_std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_250_000.0), "$1,250,000");
        assert_eq!(format_currency(999.6), "$1,000");
        assert_eq!(format_currency(12.0), "$12");
        assert_eq!(format_currency(-4500.0), "-$4,500");
        assert_eq!(format_currency(0.0), "$0");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.12345, 2), 0.12);
        assert_eq!(round_to(1234.5, 0), 1235.0);
    }
}
