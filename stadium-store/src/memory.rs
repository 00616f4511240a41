//! In-memory implementations of every repository, for tests and for running
//! without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use stadium_core::booking::Booking;
use stadium_core::field::{Field, FieldDraft, FieldRemoval, Image, Upload};
use stadium_core::identity::{NewUser, Session, User};
use stadium_core::overlap::{ensure_no_conflict, Candidate};
use stadium_core::repository::{
    BookingRepository, FieldRepository, ImageRepository, MediaStore, SessionRepository, UserRepository,
};
use stadium_core::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: BTreeMap<i64, User>,
    sessions: HashMap<Uuid, Session>,
    fields: BTreeMap<i64, Field>,
    images: BTreeMap<i64, Image>,
    bookings: BTreeMap<i64, Booking>,
    media: HashMap<String, Vec<u8>>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_candidate(&self, candidate: &Candidate) -> CoreResult<()> {
        if !self.fields.contains_key(&candidate.field_id) {
            return Err(CoreError::ValidationError(format!(
                "Invalid field \"{}\" - object does not exist.",
                candidate.field_id
            )));
        }
        ensure_no_conflict(self.bookings.values(), candidate)
    }
}

/// One shared state behind a single lock. Each write, including the
/// booking overlap check, happens under the write guard.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a media file is currently stored at `path`.
    pub async fn has_media(&self, path: &str) -> bool {
        self.state.read().await.media.contains_key(path)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(CoreError::ValidationError(
                "A user with that username already exists.".to_string(),
            ));
        }
        let id = state.allocate_id();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> CoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, session: &Session) -> CoreResult<()> {
        self.state.write().await.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> CoreResult<Option<Session>> {
        Ok(self.state.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.state.write().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl FieldRepository for MemoryStore {
    async fn create_field(&self, owner: Option<i64>, draft: &FieldDraft) -> CoreResult<Field> {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        let field = Field {
            id,
            owner,
            name: draft.name.clone(),
            address: draft.address.clone(),
            contact: draft.contact.clone(),
            hourly_rate: draft.hourly_rate,
            latitude: draft.latitude,
            longitude: draft.longitude,
        };
        state.fields.insert(id, field.clone());
        Ok(field)
    }

    async fn get_field(&self, id: i64) -> CoreResult<Option<Field>> {
        Ok(self.state.read().await.fields.get(&id).cloned())
    }

    async fn list_fields(&self) -> CoreResult<Vec<Field>> {
        Ok(self.state.read().await.fields.values().rev().cloned().collect())
    }

    async fn update_field(&self, id: i64, draft: &FieldDraft) -> CoreResult<Option<Field>> {
        let mut state = self.state.write().await;
        Ok(state.fields.get_mut(&id).map(|field| {
            field.name = draft.name.clone();
            field.address = draft.address.clone();
            field.contact = draft.contact.clone();
            field.hourly_rate = draft.hourly_rate;
            field.latitude = draft.latitude;
            field.longitude = draft.longitude;
            field.clone()
        }))
    }

    async fn delete_field(&self, id: i64) -> CoreResult<Option<FieldRemoval>> {
        let mut state = self.state.write().await;
        if state.fields.remove(&id).is_none() {
            return Ok(None);
        }

        let image_ids: Vec<i64> = state
            .images
            .values()
            .filter(|i| i.field_id == id)
            .map(|i| i.id)
            .collect();
        let images = image_ids.iter().filter_map(|image_id| state.images.remove(image_id)).collect();

        let before = state.bookings.len();
        state.bookings.retain(|_, b| b.field_id != id);
        let bookings_removed = (before - state.bookings.len()) as u64;

        Ok(Some(FieldRemoval { images, bookings_removed }))
    }
}

#[async_trait]
impl ImageRepository for MemoryStore {
    async fn add_image(&self, field_id: i64, name: &str, path: &str) -> CoreResult<Image> {
        let mut state = self.state.write().await;
        if !state.fields.contains_key(&field_id) {
            return Err(CoreError::StorageError(format!("field {} does not exist", field_id)));
        }
        let id = state.allocate_id();
        let image = Image {
            id,
            field_id,
            name: name.to_string(),
            path: path.to_string(),
        };
        state.images.insert(id, image.clone());
        Ok(image)
    }

    async fn list_for_fields(&self, field_ids: &[i64]) -> CoreResult<Vec<Image>> {
        let state = self.state.read().await;
        Ok(state
            .images
            .values()
            .filter(|i| field_ids.contains(&i.field_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, user_id: i64, candidate: &Candidate) -> CoreResult<Booking> {
        let mut state = self.state.write().await;
        state.check_candidate(candidate)?;
        let id = state.allocate_id();
        let booking = Booking {
            id,
            field_id: candidate.field_id,
            user_id,
            booking_date: candidate.date,
            start_time: candidate.slot.start(),
            end_time: candidate.slot.end(),
            created_at: Utc::now(),
        };
        state.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn update_booking(&self, id: i64, candidate: &Candidate) -> CoreResult<Option<Booking>> {
        let mut state = self.state.write().await;
        state.check_candidate(candidate)?;
        Ok(state.bookings.get_mut(&id).map(|booking| {
            booking.field_id = candidate.field_id;
            booking.booking_date = candidate.date;
            booking.start_time = candidate.slot.start();
            booking.end_time = candidate.slot.end();
            booking.clone()
        }))
    }

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state.bookings.values().cloned().collect();
        bookings.sort_by_key(|b| (b.booking_date, b.start_time, b.id));
        Ok(bookings)
    }

    async fn list_on_date(&self, date: NaiveDate) -> CoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.booking_date == date)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.start_time, b.id));
        Ok(bookings)
    }

    async fn delete_booking(&self, id: i64) -> CoreResult<bool> {
        Ok(self.state.write().await.bookings.remove(&id).is_some())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn save(&self, upload: &Upload) -> CoreResult<String> {
        let mut state = self.state.write().await;
        let path = format!(
            "images/{}_{}",
            state.allocate_id(),
            crate::media::sanitize_file_name(&upload.file_name)
        );
        state.media.insert(path.clone(), upload.bytes.clone());
        Ok(path)
    }

    async fn remove(&self, path: &str) -> CoreResult<()> {
        match self.state.write().await.media.remove(path) {
            Some(_) => Ok(()),
            None => Err(CoreError::StorageError(format!("no media stored at {}", path))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use stadium_core::overlap::TimeSlot;
    use std::sync::Arc;

    fn draft() -> FieldDraft {
        FieldDraft {
            name: "North Pitch".to_string(),
            address: "1 Park Lane".to_string(),
            contact: "555-0101".to_string(),
            hourly_rate: 30.0,
            latitude: 10.0,
            longitude: 20.0,
        }
    }

    fn candidate(field_id: i64, start: u32, end: u32) -> Candidate {
        Candidate::new(
            field_id,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            TimeSlot::new(
                NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_booking_write_runs_overlap_guard() {
        let store = MemoryStore::new();
        let field = store.create_field(None, &draft()).await.unwrap();

        let first = store.create_booking(1, &candidate(field.id, 10, 11)).await.unwrap();
        assert!(matches!(
            store.create_booking(2, &candidate(field.id, 10, 12)).await,
            Err(CoreError::ValidationConflict(_))
        ));
        store.create_booking(2, &candidate(field.id, 11, 12)).await.unwrap();

        // Moving a booking within its own slot is not a conflict with itself.
        let moved = store
            .update_booking(first.id, &candidate(field.id, 9, 11).excluding(first.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_field_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_booking(1, &candidate(99, 10, 11)).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let field = store.create_field(None, &draft()).await.unwrap();

        let mut handles = Vec::new();
        for user_id in 0..16 {
            let store = store.clone();
            let field_id = field.id;
            handles.push(tokio::spawn(async move {
                store.create_booking(user_id, &candidate(field_id, 10, 11)).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(store.list_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_field_delete_takes_dependents_along() {
        let store = MemoryStore::new();
        let field = store.create_field(None, &draft()).await.unwrap();
        let other = store.create_field(None, &draft()).await.unwrap();
        store.add_image(field.id, "a.png", "images/a.png").await.unwrap();
        store.create_booking(1, &candidate(field.id, 10, 11)).await.unwrap();
        store.create_booking(1, &candidate(other.id, 10, 11)).await.unwrap();

        let removal = store.delete_field(field.id).await.unwrap().unwrap();
        assert_eq!(removal.images.len(), 1);
        assert_eq!(removal.images[0].path, "images/a.png");
        assert_eq!(removal.bookings_removed, 1);

        assert!(store.get_field(field.id).await.unwrap().is_none());
        assert_eq!(store.list_bookings().await.unwrap().len(), 1);
        assert!(store.delete_field(field.id).await.unwrap().is_none());

        // The field is gone, so a late booking is turned away.
        assert!(matches!(
            store.create_booking(2, &candidate(field.id, 12, 13)).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_delete_and_booking_leave_no_orphans() {
        let store = Arc::new(MemoryStore::new());
        let field = store.create_field(None, &draft()).await.unwrap();

        let booker = {
            let store = store.clone();
            tokio::spawn(async move { store.create_booking(1, &candidate(field.id, 10, 11)).await })
        };
        let remover = {
            let store = store.clone();
            tokio::spawn(async move { store.delete_field(field.id).await })
        };

        let _ = booker.await.unwrap();
        assert!(remover.await.unwrap().unwrap().is_some());
        assert!(store.list_bookings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept() {
        let store = MemoryStore::new();
        let stale = Session::open(1, 0);
        let live = Session::open(1, 3600);
        store.create_session(&stale).await.unwrap();
        store.create_session(&live).await.unwrap();

        assert_eq!(store.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(store.get_session(stale.id).await.unwrap().is_none());
        assert!(store.get_session(live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fields_listed_newest_first() {
        let store = MemoryStore::new();
        let a = store.create_field(None, &draft()).await.unwrap();
        let b = store.create_field(None, &draft()).await.unwrap();
        let ids: Vec<i64> = store.list_fields().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}
