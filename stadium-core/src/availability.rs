//! Free-field lookup for a date/time window, with optional distance ordering.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use stadium_shared::GeoPoint;

use crate::booking::Booking;
use crate::field::Field;
use crate::overlap::intervals_overlap;
use crate::time::{parse_clock, parse_date};
use crate::CoreResult;

/// The `[start, end)` range on `date` a caller wants to play in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    /// Whether `booking` takes any part of this window.
    pub fn is_blocked_by(&self, booking: &Booking) -> bool {
        booking.booking_date == self.date
            && intervals_overlap(booking.start_time, booking.end_time, self.start, self.end)
    }
}

/// Raw query-string parameters of the availability endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub booking_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl AvailabilityQuery {
    /// Builds the window when date, start and end are all present.
    ///
    /// Present times are validated even when the window is incomplete.
    pub fn window(&self) -> CoreResult<Option<Window>> {
        let start = present(&self.start_time).map(parse_clock).transpose()?;
        let end = present(&self.end_time).map(parse_clock).transpose()?;

        match (present(&self.booking_date), start, end) {
            (Some(date), Some(start), Some(end)) => Ok(Some(Window {
                date: parse_date(date)?,
                start,
                end,
            })),
            _ => Ok(None),
        }
    }

    /// The observer point, or `None` when either coordinate is missing or malformed.
    pub fn observer(&self) -> Option<GeoPoint> {
        let lat = present(&self.lat)?.trim().parse::<f64>().ok()?;
        let lon = present(&self.lon)?.trim().parse::<f64>().ok()?;
        Some(GeoPoint::new(lat, lon)).filter(GeoPoint::is_finite)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Drops fields booked anywhere inside `window`, then orders the rest by
/// Euclidean distance from `observer`. Sorting is stable, so equidistant
/// fields keep their input order. With neither argument the input is
/// returned untouched.
pub fn filter_available(
    fields: Vec<Field>,
    bookings: &[Booking],
    window: Option<&Window>,
    observer: Option<&GeoPoint>,
) -> Vec<Field> {
    let mut available: Vec<Field> = match window {
        Some(window) => fields
            .into_iter()
            .filter(|field| {
                !bookings
                    .iter()
                    .any(|b| b.field_id == field.id && window.is_blocked_by(b))
            })
            .collect(),
        None => fields,
    };

    if let Some(observer) = observer {
        let mut ranked: Vec<(f64, Field)> = available
            .into_iter()
            .map(|field| (observer.euclidean_distance(&field.location()), field))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        available = ranked.into_iter().map(|(_, field)| field).collect();
    }

    available
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use chrono::Utc;

    fn field(id: i64, latitude: f64, longitude: f64) -> Field {
        Field {
            id,
            owner: None,
            name: format!("Field {}", id),
            address: "somewhere".to_string(),
            contact: "555".to_string(),
            hourly_rate: 20.0,
            latitude,
            longitude,
        }
    }

    fn booking(field_id: i64, date: &str, start: &str, end: &str) -> Booking {
        Booking {
            id: field_id * 100,
            field_id,
            user_id: 1,
            booking_date: parse_date(date).unwrap(),
            start_time: parse_clock(start).unwrap(),
            end_time: parse_clock(end).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn query(date: Option<&str>, start: Option<&str>, end: Option<&str>) -> AvailabilityQuery {
        AvailabilityQuery {
            booking_date: date.map(str::to_string),
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
            ..Default::default()
        }
    }

    fn ids(fields: &[Field]) -> Vec<i64> {
        fields.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_no_window_no_observer_is_identity() {
        let fields = vec![field(3, 5.0, 5.0), field(1, 0.0, 0.0), field(2, 1.0, 1.0)];
        let bookings = vec![booking(1, "2025-06-01", "10:00", "11:00")];
        let result = filter_available(fields.clone(), &bookings, None, None);
        assert_eq!(result, fields);
    }

    #[test]
    fn test_window_excludes_overlapping_but_not_touching() {
        let fields = vec![field(1, 0.0, 0.0), field(2, 1.0, 1.0)];
        let bookings = vec![booking(1, "2025-06-01", "10:00", "11:00")];

        let overlapping = query(Some("2025-06-01"), Some("10:30"), Some("11:30"))
            .window()
            .unwrap()
            .unwrap();
        assert_eq!(ids(&filter_available(fields.clone(), &bookings, Some(&overlapping), None)), vec![2]);

        let touching = query(Some("2025-06-01"), Some("11:00"), Some("12:00"))
            .window()
            .unwrap()
            .unwrap();
        assert_eq!(ids(&filter_available(fields.clone(), &bookings, Some(&touching), None)), vec![1, 2]);

        let other_day = query(Some("2025-06-02"), Some("10:30"), Some("11:30"))
            .window()
            .unwrap()
            .unwrap();
        assert_eq!(ids(&filter_available(fields, &bookings, Some(&other_day), None)), vec![1, 2]);
    }

    #[test]
    fn test_observer_orders_by_distance_with_stable_ties() {
        let fields = vec![
            field(1, 3.0, 4.0),
            field(2, 1.0, 0.0),
            field(3, -4.0, 3.0),
            field(4, 0.0, -1.0),
        ];
        let origin = GeoPoint::new(0.0, 0.0);
        let result = filter_available(fields, &[], None, Some(&origin));
        assert_eq!(ids(&result), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_window_and_observer_combined() {
        let fields = vec![field(1, 0.1, 0.0), field(2, 9.0, 9.0), field(3, 2.0, 2.0)];
        let bookings = vec![booking(1, "2025-06-01", "18:00", "20:00")];
        let window = query(Some("2025-06-01"), Some("19:00"), Some("19:30"))
            .window()
            .unwrap();
        let origin = GeoPoint::new(0.0, 0.0);
        let result = filter_available(fields, &bookings, window.as_ref(), Some(&origin));
        assert_eq!(ids(&result), vec![3, 2]);
    }

    #[test]
    fn test_incomplete_window_is_ignored_but_times_still_checked() {
        assert!(query(Some("2025-06-01"), Some("10:00"), None).window().unwrap().is_none());
        assert!(query(None, Some("10:00"), Some("11:00")).window().unwrap().is_none());

        let err = query(None, Some("25:99"), None).window().unwrap_err();
        assert!(matches!(err, CoreError::ParseError { ref value, .. } if value == "25:99"));
    }

    #[test]
    fn test_bad_date_is_a_parse_error() {
        let err = query(Some("June 1st"), Some("10:00"), Some("11:00")).window().unwrap_err();
        assert!(matches!(err, CoreError::ParseError { kind: "date", .. }));
    }

    #[test]
    fn test_malformed_observer_is_skipped() {
        let with = |lat: Option<&str>, lon: Option<&str>| AvailabilityQuery {
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
            ..Default::default()
        };
        assert_eq!(with(Some(" 1.5 "), Some("-2")).observer(), Some(GeoPoint::new(1.5, -2.0)));
        assert_eq!(with(Some("north"), Some("2")).observer(), None);
        assert_eq!(with(Some("1"), None).observer(), None);
        assert_eq!(with(Some("NaN"), Some("2")).observer(), None);

        let fields = vec![field(2, 9.0, 9.0), field(1, 0.0, 0.0)];
        let observer = with(Some("abc"), Some("0")).observer();
        let result = filter_available(fields, &[], None, observer.as_ref());
        assert_eq!(ids(&result), vec![2, 1]);
    }
}
