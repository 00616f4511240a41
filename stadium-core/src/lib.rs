pub mod accounts;
pub mod availability;
pub mod booking;
pub mod credentials;
pub mod field;
pub mod identity;
pub mod manager;
pub mod overlap;
pub mod repository;
pub mod time;

pub use accounts::AccountManager;
pub use availability::{filter_available, AvailabilityQuery, Window};
pub use booking::{Booking, BookingDraft};
pub use field::{Field, FieldDraft, FieldListing, FieldRemoval, Image, Upload};
pub use identity::{PublicUser, Registration, Role, Session, User};
pub use manager::{BookingManager, CascadeReport, FieldManager};
pub use overlap::{conflicts, ensure_no_conflict, Candidate, TimeSlot};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0}")]
    ValidationConflict(String),
    #[error("Invalid {kind} format: '{value}'. Must be in '{pattern}' format.")]
    ParseError {
        kind: &'static str,
        value: String,
        pattern: &'static str,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
