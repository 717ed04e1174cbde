//! Canonical timestamp formatting for audit columns.

use chrono::{DateTime, Local, TimeZone};

/// `strftime` pattern of the canonical timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format an instant as `YYYY-MM-DD HH:MM:SS` in the instant's own zone, without a zone suffix.
pub fn format_timestamp<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// The current local time as a canonical timestamp.
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn formats_zero_padded_local_time() {
        let instant = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&instant), "2024-01-02 03:04:05");
    }

    #[test]
    fn uses_24_hour_clock() {
        let instant = Local.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(format_timestamp(&instant), "2023-12-31 23:59:59");
    }

    #[test]
    fn now_is_parseable() {
        let now = now_timestamp();
        assert_eq!(now.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&now, TIMESTAMP_FORMAT).is_ok());
    }
}
