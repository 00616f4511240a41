pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod field_repo;
pub mod media;
pub mod memory;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use field_repo::{PgFieldRepository, PgImageRepository};
pub use media::LocalMediaStore;
pub use memory::MemoryStore;
pub use user_repo::{PgSessionRepository, PgUserRepository};

use stadium_core::CoreError;

/// Maps a driver error into the core's storage variant.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::StorageError(err.to_string())
}
