//! Unix timestamp converter

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

use super::{ToolError, ToolResult};

/// Magnitudes at or above this are read as milliseconds (~ year 5138 in seconds)
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampInfo {
    pub unix_seconds: i64,
    pub unix_millis: i64,
    /// RFC 3339 in UTC
    pub iso8601: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC
    pub utc: String,
    /// How the input was interpreted
    pub detected_unit: TimestampUnit,
}

impl TimestampInfo {
    fn from_datetime(dt: DateTime<Utc>, detected_unit: TimestampUnit) -> Self {
        Self {
            unix_seconds: dt.timestamp(),
            unix_millis: dt.timestamp_millis(),
            iso8601: dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            utc: dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            detected_unit,
        }
    }
}

/// Interpret a Unix timestamp, detecting seconds vs milliseconds by magnitude
pub fn from_unix(value: i64) -> ToolResult<TimestampInfo> {
    let (dt, unit) = if value.unsigned_abs() >= MILLIS_THRESHOLD as u64 {
        (Utc.timestamp_millis_opt(value).single(), TimestampUnit::Milliseconds)
    } else {
        (Utc.timestamp_opt(value, 0).single(), TimestampUnit::Seconds)
    };
    let dt = dt.ok_or_else(|| ToolError::out_of_range(format!("timestamp {} is out of range", value)))?;
    Ok(TimestampInfo::from_datetime(dt, unit))
}

/// Parse a date/time string into a timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn to_unix(text: &str) -> ToolResult<TimestampInfo> {
    let text = text.trim();
    let dt = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| {
            ToolError::invalid_input(format!(
                "'{}' is not RFC 3339, YYYY-MM-DD HH:MM:SS or YYYY-MM-DD",
                text
            ))
        })?;
    Ok(TimestampInfo::from_datetime(dt, TimestampUnit::Seconds))
}

/// Current time
pub fn now() -> TimestampInfo {
    TimestampInfo::from_datetime(Utc::now(), TimestampUnit::Milliseconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unix_seconds() {
        let info = from_unix(1_700_000_000).unwrap();
        assert_eq!(info.detected_unit, TimestampUnit::Seconds);
        assert_eq!(info.iso8601, "2023-11-14T22:13:20Z");
        assert_eq!(info.utc, "2023-11-14 22:13:20");
        assert_eq!(info.unix_millis, 1_700_000_000_000);
    }

    #[test]
    fn test_from_unix_millis() {
        let info = from_unix(1_700_000_000_123).unwrap();
        assert_eq!(info.detected_unit, TimestampUnit::Milliseconds);
        assert_eq!(info.unix_seconds, 1_700_000_000);
        assert_eq!(info.iso8601, "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_from_unix_epoch_and_negative() {
        assert_eq!(from_unix(0).unwrap().iso8601, "1970-01-01T00:00:00Z");
        assert_eq!(from_unix(-86_400).unwrap().utc, "1969-12-31 00:00:00");
    }

    #[test]
    fn test_from_unix_out_of_range() {
        assert!(matches!(from_unix(i64::MAX), Err(ToolError::OutOfRange(_))));
    }

    #[test]
    fn test_to_unix_formats() {
        assert_eq!(to_unix("2023-11-14T22:13:20Z").unwrap().unix_seconds, 1_700_000_000);
        assert_eq!(to_unix("2023-11-15T00:13:20+02:00").unwrap().unix_seconds, 1_700_000_000);
        assert_eq!(to_unix("2023-11-14 22:13:20").unwrap().unix_seconds, 1_700_000_000);
        assert_eq!(to_unix("1970-01-02").unwrap().unix_seconds, 86_400);
        assert!(to_unix("yesterday").is_err());
    }

    #[test]
    fn test_now_is_recent() {
        let info = now();
        assert!((info.unix_seconds - Utc::now().timestamp()).abs() <= 1);
    }
}
