//! Booking overlap detection.
//!
//! Slots are half-open `[start, end)`: a booking ending at 11:00 and one
//! starting at 11:00 on the same field do not collide.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::booking::Booking;
use crate::{CoreError, CoreResult};

pub const CONFLICT_MESSAGE: &str = "This stadium is already booked for the selected time.";

/// True iff `[s1, e1)` and `[s2, e2)` share at least one instant.
pub fn intervals_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// A validated time range with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> CoreResult<Self> {
        if start >= end {
            return Err(CoreError::ValidationError(format!(
                "start_time ({}) must be before end_time ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        intervals_overlap(self.start, self.end, other.start, other.end)
    }
}

/// A booking that has not been written yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub field_id: i64,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    /// Booking being replaced by this candidate, ignored during the check.
    pub exclude: Option<i64>,
}

impl Candidate {
    pub fn new(field_id: i64, date: NaiveDate, slot: TimeSlot) -> Self {
        Self {
            field_id,
            date,
            slot,
            exclude: None,
        }
    }

    pub fn excluding(mut self, booking_id: i64) -> Self {
        self.exclude = Some(booking_id);
        self
    }

    fn collides_with(&self, booking: &Booking) -> bool {
        booking.field_id == self.field_id
            && booking.booking_date == self.date
            && self.exclude != Some(booking.id)
            && intervals_overlap(
                booking.start_time,
                booking.end_time,
                self.slot.start(),
                self.slot.end(),
            )
    }
}

/// Returns true if any existing booking on the candidate's field and date
/// overlaps the candidate's slot.
pub fn conflicts<'a, I>(existing: I, candidate: &Candidate) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    existing.into_iter().any(|booking| candidate.collides_with(booking))
}

pub fn ensure_no_conflict<'a, I>(existing: I, candidate: &Candidate) -> CoreResult<()>
where
    I: IntoIterator<Item = &'a Booking>,
{
    if conflicts(existing, candidate) {
        return Err(CoreError::ValidationConflict(CONFLICT_MESSAGE.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn booking(id: i64, field_id: i64, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Booking {
        Booking {
            id,
            field_id,
            user_id: 1,
            booking_date: date,
            start_time: start,
            end_time: end,
            created_at: Utc::now(),
        }
    }

    fn candidate(start: NaiveTime, end: NaiveTime) -> Candidate {
        Candidate::new(1, day(), TimeSlot::new(start, end).unwrap())
    }

    #[test]
    fn test_time_slot_requires_start_before_end() {
        assert!(TimeSlot::new(at(10, 0), at(11, 0)).is_ok());
        assert!(matches!(
            TimeSlot::new(at(11, 0), at(10, 0)),
            Err(CoreError::ValidationError(_))
        ));
        assert!(TimeSlot::new(at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_adjacent_bookings_do_not_conflict() {
        let existing = vec![booking(1, 1, day(), at(10, 0), at(11, 0))];
        assert!(!conflicts(&existing, &candidate(at(11, 0), at(12, 0))));
        assert!(!conflicts(&existing, &candidate(at(9, 0), at(10, 0))));
    }

    #[test]
    fn test_partial_and_nested_overlaps_conflict() {
        let existing = vec![booking(1, 1, day(), at(10, 0), at(11, 0))];
        assert!(conflicts(&existing, &candidate(at(10, 30), at(11, 30))));
        assert!(conflicts(&existing, &candidate(at(9, 30), at(10, 1))));
        assert!(conflicts(&existing, &candidate(at(10, 15), at(10, 45))));
        assert!(conflicts(&existing, &candidate(at(8, 0), at(12, 0))));
        assert!(conflicts(&existing, &candidate(at(10, 0), at(11, 0))));
    }

    #[test]
    fn test_other_fields_and_dates_are_ignored() {
        let other_day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let existing = vec![
            booking(1, 2, day(), at(10, 0), at(11, 0)),
            booking(2, 1, other_day, at(10, 0), at(11, 0)),
        ];
        assert!(!conflicts(&existing, &candidate(at(10, 0), at(11, 0))));
    }

    #[test]
    fn test_excluded_booking_is_skipped() {
        let existing = vec![booking(7, 1, day(), at(10, 0), at(11, 0))];
        let moved = candidate(at(10, 30), at(11, 30)).excluding(7);
        assert!(!conflicts(&existing, &moved));
        assert!(conflicts(&existing, &candidate(at(10, 30), at(11, 30)).excluding(8)));
    }

    #[test]
    fn test_ensure_no_conflict_signals_validation_conflict() {
        let existing = vec![booking(1, 1, day(), at(10, 0), at(11, 0))];
        let err = ensure_no_conflict(&existing, &candidate(at(10, 30), at(11, 30))).unwrap_err();
        assert!(matches!(err, CoreError::ValidationConflict(ref msg) if msg == CONFLICT_MESSAGE));
        assert!(ensure_no_conflict(&existing, &candidate(at(11, 0), at(12, 0))).is_ok());
    }

    #[test]
    fn test_overlap_matches_shared_instant_on_quarter_hour_grid() {
        // Every pair of valid slots on a 15 minute grid between 08:00 and 12:00.
        let grid: Vec<NaiveTime> = (0..=16).map(|i| at(8 + i / 4, (i % 4) * 15)).collect();
        let minutes = |t: NaiveTime| {
            use chrono::Timelike;
            t.hour() * 60 + t.minute()
        };

        for (i, &s1) in grid.iter().enumerate() {
            for &e1 in &grid[i + 1..] {
                for (j, &s2) in grid.iter().enumerate() {
                    for &e2 in &grid[j + 1..] {
                        let shares_minute = (minutes(s1)..minutes(e1))
                            .any(|m| m >= minutes(s2) && m < minutes(e2));
                        let existing = vec![booking(1, 1, day(), s1, e1)];
                        assert_eq!(
                            conflicts(&existing, &candidate(s2, e2)),
                            shares_minute,
                            "[{}, {}) vs [{}, {})",
                            s1,
                            e1,
                            s2,
                            e2
                        );
                    }
                }
            }
        }
    }
}
