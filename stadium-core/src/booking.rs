use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::overlap::{Candidate, TimeSlot};
use crate::time::clock;
use crate::CoreResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(rename = "field")]
    pub field_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub booking_date: NaiveDate,
    #[serde(with = "clock")]
    pub start_time: NaiveTime,
    #[serde(with = "clock")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// Client-supplied booking attributes, used for both create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingDraft {
    pub field: i64,
    pub booking_date: NaiveDate,
    #[serde(with = "clock")]
    pub start_time: NaiveTime,
    #[serde(with = "clock")]
    pub end_time: NaiveTime,
}

impl BookingDraft {
    pub fn slot(&self) -> CoreResult<TimeSlot> {
        TimeSlot::new(self.start_time, self.end_time)
    }

    pub fn candidate(&self) -> CoreResult<Candidate> {
        Ok(Candidate::new(self.field, self.booking_date, self.slot()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_accepts_short_clock_values() {
        let json = r#"{"field": 3, "booking_date": "2025-06-01", "start_time": "10:00", "end_time": "11:30:00"}"#;
        let draft: BookingDraft = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(draft.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(draft.end_time, NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert!(draft.candidate().is_ok());
    }

    #[test]
    fn test_draft_rejects_bad_clock() {
        let json = r#"{"field": 3, "booking_date": "2025-06-01", "start_time": "25:99", "end_time": "11:00"}"#;
        let err = serde_json::from_str::<BookingDraft>(json).unwrap_err();
        assert!(err.to_string().contains("25:99"));
    }

    #[test]
    fn test_inverted_draft_has_no_candidate() {
        let json = r#"{"field": 3, "booking_date": "2025-06-01", "start_time": "12:00", "end_time": "11:00"}"#;
        let draft: BookingDraft = serde_json::from_str(json).unwrap();
        assert!(draft.candidate().is_err());
    }

    #[test]
    fn test_booking_wire_names() {
        let booking = Booking {
            id: 1,
            field_id: 2,
            user_id: 3,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["field"], 2);
        assert_eq!(value["user"], 3);
        assert_eq!(value["start_time"], "10:00:00");
        assert_eq!(value["booking_date"], "2025-06-01");
    }
}
