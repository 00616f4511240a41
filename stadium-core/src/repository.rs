use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::booking::Booking;
use crate::field::{Field, FieldDraft, FieldRemoval, Image, Upload};
use crate::identity::{NewUser, Session, User};
use crate::overlap::Candidate;
use crate::CoreResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `ValidationError` when the username is taken.
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn get_user(&self, id: i64) -> CoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>>;
}

/// Repository trait for bearer-token sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &Session) -> CoreResult<()>;

    async fn get_session(&self, id: Uuid) -> CoreResult<Option<Session>>;

    /// Returns whether a session was removed.
    async fn delete_session(&self, id: Uuid) -> CoreResult<bool>;

    /// Drops every session that expired before `now`; returns how many.
    async fn delete_expired(&self, now: DateTime<Utc>) -> CoreResult<u64>;
}

/// Repository trait for fields
#[async_trait]
pub trait FieldRepository: Send + Sync {
    async fn create_field(&self, owner: Option<i64>, draft: &FieldDraft) -> CoreResult<Field>;

    async fn get_field(&self, id: i64) -> CoreResult<Option<Field>>;

    /// Newest first.
    async fn list_fields(&self) -> CoreResult<Vec<Field>>;

    async fn update_field(&self, id: i64, draft: &FieldDraft) -> CoreResult<Option<Field>>;

    /// Deletes the field with its image rows and bookings in one transaction,
    /// holding the field's row lock so no booking can slip in. `None` when the
    /// field does not exist.
    async fn delete_field(&self, id: i64) -> CoreResult<Option<FieldRemoval>>;
}

/// Repository trait for field images
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn add_image(&self, field_id: i64, name: &str, path: &str) -> CoreResult<Image>;

    async fn list_for_fields(&self, field_ids: &[i64]) -> CoreResult<Vec<Image>>;
}

/// Repository trait for bookings
///
/// Writes must run the overlap check and the write under one lock or
/// transaction, so concurrent requests cannot both pass the check.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, user_id: i64, candidate: &Candidate) -> CoreResult<Booking>;

    /// `candidate.exclude` must name the booking being updated.
    async fn update_booking(&self, id: i64, candidate: &Candidate) -> CoreResult<Option<Booking>>;

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>>;

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>>;

    async fn list_on_date(&self, date: NaiveDate) -> CoreResult<Vec<Booking>>;

    async fn delete_booking(&self, id: i64) -> CoreResult<bool>;
}

/// Blob storage for uploaded images
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the upload and returns its path relative to the media root.
    async fn save(&self, upload: &Upload) -> CoreResult<String>;

    async fn remove(&self, path: &str) -> CoreResult<()>;
}
