//! Date helper functions

use chrono::NaiveDate;

use crate::content::parse_date_string;

/// Format a date using a Moment.js-style format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// format_date(&date, "LL")         // -> "January 15, 2024"
/// ```
pub fn format_date(date: &NaiveDate, format: &str) -> String {
    if format == "LL" {
        return date.format("%B %-d, %Y").to_string();
    }
    date.format(&moment_to_chrono_format(format)).to_string()
}

/// Reformat a date string; text that is not a date comes back unchanged
pub fn reformat_date_str(value: &str, format: &str) -> String {
    match parse_date_string(value) {
        Some(date) => format_date(&date, format),
        None => value.to_string(),
    }
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each family so "MM" never eats "MMMM"
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(&date, "YYYY-MM-DD"), "2024-01-05");
        assert_eq!(format_date(&date, "YYYY/MM/DD"), "2024/01/05");
        assert_eq!(format_date(&date, "LL"), "January 5, 2024");
        assert_eq!(format_date(&date, "MMM YYYY"), "Jan 2024");
    }

    #[test]
    fn test_reformat_date_str() {
        assert_eq!(reformat_date_str("2024-01-15 10:00:00", "YYYY-MM-DD"), "2024-01-15");
        assert_eq!(reformat_date_str("soon", "LL"), "soon");
    }
}
