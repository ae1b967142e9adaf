//! Lenient parsing for the loosely formatted fields found in advertising and
//! order report exports.

use chrono::NaiveDate;
use tracing::warn;

// ── NumericField ──────────────────────────────────────────────────────────────

/// Parses the numeric columns of report exports, which mix plain numbers with
/// currency strings (`"$1,234.56"`) and percentages (`"12.5%"`).
pub struct NumericField;

impl NumericField {
    /// Parse a raw cell into an `f64`, coercing anything unparseable to 0.
    ///
    /// Strips `$`, `%`, thousands separators and surrounding whitespace
    /// before parsing.
    pub fn parse(raw: &str) -> f64 {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '$' | '%' | ',' | ' '))
            .collect();
        if cleaned.is_empty() {
            return 0.0;
        }
        cleaned.parse::<f64>().unwrap_or(0.0)
    }
}

// ── DateField ─────────────────────────────────────────────────────────────────

/// Parses report dates across the formats seen in the exports: ISO dates,
/// US-style dates, spelled-out month names, and full RFC 3339 timestamps on
/// order lines.
pub struct DateField;

impl DateField {
    /// Attempt to parse a date cell. Returns `None` (and warns once per
    /// value) when no format matches; callers drop such rows.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        // Order reports carry full timestamps, e.g. 2025-12-01T08:00:00+00:00.
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%d",
            "%m/%d/%Y",
            "%m/%d/%y",
            "%b %d, %Y",
            "%B %d, %Y",
        ];
        for fmt in FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(date);
            }
        }

        warn!("DateField: could not parse date string \"{}\"", s);
        None
    }
}

/// Month key for a report date, e.g. `"2025-12"`. Used as the grouping key
/// for monthly aggregation so keys sort chronologically as strings.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Day key for a report date, e.g. `"2025-12-15"`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── NumericField ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_plain_number() {
        assert!((NumericField::parse("123.45") - 123.45).abs() < 1e-9);
    }

    #[test]
    fn test_parse_currency_with_separators() {
        assert!((NumericField::parse("$1,234.56") - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn test_parse_percent_symbol_stripped() {
        assert!((NumericField::parse("12.5%") - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_garbage_coerces_to_zero() {
        assert_eq!(NumericField::parse("n/a"), 0.0);
        assert_eq!(NumericField::parse(""), 0.0);
        assert_eq!(NumericField::parse("  "), 0.0);
    }

    #[test]
    fn test_parse_negative() {
        assert!((NumericField::parse("-42.5") + 42.5).abs() < 1e-9);
    }

    // ── DateField ─────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_iso_date() {
        let d = DateField::parse("2025-12-15").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_parse_us_date() {
        let d = DateField::parse("12/15/2025").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_parse_month_name_date() {
        let d = DateField::parse("Dec 15, 2025").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let d = DateField::parse("2025-12-01T08:30:00+00:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn test_parse_unparseable_date_returns_none() {
        assert!(DateField::parse("not a date").is_none());
        assert!(DateField::parse("").is_none());
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_month_and_day_keys() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
        assert_eq!(month_key(d), "2025-12");
        assert_eq!(day_key(d), "2025-12-05");
    }
}
