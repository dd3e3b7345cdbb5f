// Display formatting for release dates
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const NO_DATE: &str = "No date available";
pub const INVALID_DATE: &str = "Invalid Date";

const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Render a backend date string as `dd/MM/yyyy`
///
/// Never fails: a missing or empty value gives [`NO_DATE`], anything that
/// does not parse gives [`INVALID_DATE`]. Timestamps with an offset keep the
/// calendar day of that offset, so `2024-03-05T00:00:00Z` is `05/03/2024`
/// regardless of the local timezone.
pub fn format_release_date(value: Option<&str>) -> String {
    let Some(raw) = value.filter(|v| !v.is_empty()) else {
        return NO_DATE.to_string();
    };

    match parse_date(raw) {
        Some(date) => date.format(DISPLAY_FORMAT).to_string(),
        None => INVALID_DATE.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    // Some GraphQL servers serialize Date scalars as epoch milliseconds
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = raw.parse().ok()?;
        return DateTime::<Utc>::from_timestamp_millis(millis).map(|ts| ts.date_naive());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dates() {
        assert_eq!(format_release_date(None), "No date available");
        assert_eq!(format_release_date(Some("")), "No date available");
    }

    #[test]
    fn test_invalid_dates() {
        for input in ["not a date", "2024-13-40", "   ", "05/03/2024", "2024-02-30T00:00:00Z"] {
            assert_eq!(format_release_date(Some(input)), "Invalid Date", "input: {input:?}");
        }
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(format_release_date(Some("2024-03-05T00:00:00Z")), "05/03/2024");
        assert_eq!(format_release_date(Some("2023-12-31T23:59:59.123+02:00")), "31/12/2023");
    }

    #[test]
    fn test_naive_forms() {
        assert_eq!(format_release_date(Some("2024-03-05")), "05/03/2024");
        assert_eq!(format_release_date(Some("2024-03-05T10:30:00")), "05/03/2024");
        assert_eq!(format_release_date(Some("2024-03-05T10:30:00.250")), "05/03/2024");
    }

    #[test]
    fn test_epoch_millis() {
        // 2024-03-05T00:00:00Z
        assert_eq!(format_release_date(Some("1709596800000")), "05/03/2024");
    }
}
