//! Display formatting for timestamps and amounts

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// `9:05 AM` style clock time in the timestamp's own zone.
pub fn format_message_time<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%-I:%M %p").to_string()
}

/// `Oct 16, 2026` style calendar date.
pub fn format_date<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%b %-d, %Y").to_string()
}

/// en-US grouped decimal with at most three fraction digits.
pub fn format_amount(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return "Not specified".to_string();
    };

    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }

    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_message_time() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 0, 5, 0).unwrap();
        assert_eq!(format_message_time(&at), "12:05 AM");

        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(format_message_time(&at), "12:00 PM");

        let at = Utc.with_ymd_and_hms(2026, 10, 16, 21, 9, 0).unwrap();
        assert_eq!(format_message_time(&at), "9:09 PM");
    }

    #[test]
    fn test_message_time_uses_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = Utc
            .with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
            .unwrap()
            .with_timezone(&offset);
        assert_eq!(format_message_time(&at), "11:30 AM");
    }

    #[test]
    fn test_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(format_date(&at), "Mar 5, 2026");
    }

    #[test]
    fn test_amounts() {
        assert_eq!(format_amount(None), "Not specified");
        assert_eq!(format_amount(Some(0.0)), "0");
        assert_eq!(format_amount(Some(999.0)), "999");
        assert_eq!(format_amount(Some(1234.5)), "1,234.5");
        assert_eq!(format_amount(Some(1_000_000.0)), "1,000,000");
        assert_eq!(format_amount(Some(12.3456)), "12.346");
        assert_eq!(format_amount(Some(-2500.25)), "-2,500.25");
        assert_eq!(format_amount(Some(-0.0001)), "0");
    }
}
