use sqlx::PgPool;
use stadium_core::repository::{
    BookingRepository, FieldRepository, ImageRepository, MediaStore, SessionRepository, UserRepository,
};
use stadium_core::{AccountManager, BookingManager, FieldManager};
use stadium_store::{
    LocalMediaStore, MemoryStore, PgBookingRepository, PgFieldRepository, PgImageRepository, PgSessionRepository,
    PgUserRepository,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub base_url: String,
    pub max_upload_bytes: usize,
}

impl MediaSettings {
    /// Absolute URL of a stored media path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// The storage collaborators behind the managers.
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub fields: Arc<dyn FieldRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub media: Arc<dyn MediaStore>,
}

impl Backends {
    pub fn postgres(pool: PgPool, media_root: PathBuf) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            fields: Arc::new(PgFieldRepository::new(pool.clone())),
            images: Arc::new(PgImageRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool)),
            media: Arc::new(LocalMediaStore::new(media_root)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            users: store.clone(),
            sessions: store.clone(),
            fields: store.clone(),
            images: store.clone(),
            bookings: store,
            media,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountManager>,
    pub fields: Arc<FieldManager>,
    pub bookings: Arc<BookingManager>,
    pub auth: AuthConfig,
    pub media: MediaSettings,
}

impl AppState {
    pub fn new(backends: Backends, auth: AuthConfig, media: MediaSettings) -> Self {
        Self {
            accounts: Arc::new(AccountManager::new(backends.users, backends.sessions)),
            fields: Arc::new(FieldManager::new(
                backends.fields.clone(),
                backends.images,
                backends.bookings.clone(),
                backends.media,
            )),
            bookings: Arc::new(BookingManager::new(backends.bookings, backends.fields)),
            auth,
            media,
        }
    }
}
