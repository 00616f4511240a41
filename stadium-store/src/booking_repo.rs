use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use stadium_core::booking::Booking;
use stadium_core::overlap::{ensure_no_conflict, Candidate};
use stadium_core::repository::BookingRepository;
use stadium_core::{CoreError, CoreResult};
use tracing::debug;

use crate::storage_error;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks the target field row, then runs the overlap check against the
    /// bookings already on that field and date. Concurrent writers for the
    /// same field queue on the lock until this transaction ends.
    async fn lock_and_check(tx: &mut Transaction<'_, Postgres>, candidate: &Candidate) -> CoreResult<()> {
        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM fields WHERE id = $1 FOR UPDATE")
            .bind(candidate.field_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(storage_error)?;
        if locked.is_none() {
            return Err(CoreError::ValidationError(format!(
                "Invalid field \"{}\" - object does not exist.",
                candidate.field_id
            )));
        }

        let existing: Vec<Booking> = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE field_id = $1 AND booking_date = $2",
            BOOKING_COLUMNS
        ))
        .bind(candidate.field_id)
        .bind(candidate.date)
        .fetch_all(&mut **tx)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(Booking::from)
        .collect();

        debug!(
            "Checking slot on field {} against {} booking(s) on {}",
            candidate.field_id,
            existing.len(),
            candidate.date
        );
        ensure_no_conflict(&existing, candidate)
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    field_id: i64,
    user_id: i64,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            field_id: row.field_id,
            user_id: row.user_id,
            booking_date: row.booking_date,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
        }
    }
}

const BOOKING_COLUMNS: &str = "id, field_id, user_id, booking_date, start_time, end_time, created_at";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(&self, user_id: i64, candidate: &Candidate) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        Self::lock_and_check(&mut tx, candidate).await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (field_id, user_id, booking_date, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(candidate.field_id)
        .bind(user_id)
        .bind(candidate.date)
        .bind(candidate.slot.start())
        .bind(candidate.slot.end())
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(row.into())
    }

    async fn update_booking(&self, id: i64, candidate: &Candidate) -> CoreResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        Self::lock_and_check(&mut tx, candidate).await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET field_id = $2, booking_date = $3, start_time = $4, end_time = $5
            WHERE id = $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(candidate.field_id)
        .bind(candidate.date)
        .bind(candidate.slot.start())
        .bind(candidate.slot.end())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(row.map(Booking::from))
    }

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(Booking::from))
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY booking_date, start_time, id",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn list_on_date(&self, date: NaiveDate) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE booking_date = $1 ORDER BY start_time, id",
            BOOKING_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn delete_booking(&self, id: i64) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}
