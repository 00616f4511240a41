//! Parsing of the textual date and clock formats used on the wire.

use chrono::{NaiveDate, NaiveTime};

use crate::{CoreError, CoreResult};

pub const CLOCK_FORMAT: &str = "%H:%M";
pub const CLOCK_WITH_SECONDS_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `HH:MM` clock value. Surrounding whitespace is ignored.
pub fn parse_clock(raw: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT).map_err(|_| CoreError::ParseError {
        kind: "time",
        value: raw.to_string(),
        pattern: "HH:MM",
    })
}

/// Parses `HH:MM:SS`, falling back to `HH:MM`.
pub fn parse_clock_lenient(raw: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_WITH_SECONDS_FORMAT).or_else(|_| parse_clock(raw))
}

pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| CoreError::ParseError {
        kind: "date",
        value: raw.to_string(),
        pattern: "YYYY-MM-DD",
    })
}

/// Serde adapter for clock fields: writes `HH:MM:SS`, reads `HH:MM:SS` or `HH:MM`.
pub mod clock {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(super::CLOCK_WITH_SECONDS_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_lenient(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("10:30").unwrap(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(parse_clock(" 07:05 ").unwrap(), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
    }

    #[test]
    fn test_parse_clock_names_bad_value() {
        let err = parse_clock("25:99").unwrap_err();
        match &err {
            CoreError::ParseError { kind, value, .. } => {
                assert_eq!(*kind, "time");
                assert_eq!(value, "25:99");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("'25:99'"));
    }

    #[test]
    fn test_parse_clock_rejects_seconds_and_garbage() {
        assert!(parse_clock("10:30:00").is_err());
        assert!(parse_clock("noon").is_err());
        assert!(parse_clock("").is_err());
    }

    #[test]
    fn test_parse_clock_lenient_accepts_both_forms() {
        let expected = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        assert_eq!(parse_clock_lenient("18:00").unwrap(), expected);
        assert_eq!(parse_clock_lenient("18:00:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-06-01").unwrap(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(matches!(parse_date("01/06/2025"), Err(CoreError::ParseError { kind: "date", .. })));
    }
}
