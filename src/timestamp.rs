//! Timestamps for file names and logs

use chrono::{DateTime, Local, TimeZone};

/// Format used by [`timestamp`], e.g. `2024-12-06_14-30-25`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Current local time as `yyyy-MM-dd_HH-mm-ss`
pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_fixed_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 12, 6, 14, 30, 5).unwrap();
        assert_eq!(format_timestamp(&instant), "2024-12-06_14-30-05");
    }

    #[test]
    fn test_shape() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(stamp.as_bytes()[10], b'_');
    }
}
