use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::availability::{filter_available, AvailabilityQuery};
use crate::booking::{Booking, BookingDraft};
use crate::field::{Field, FieldDraft, FieldListing, Image, Upload};
use crate::identity::User;
use crate::repository::{BookingRepository, FieldRepository, ImageRepository, MediaStore};
use crate::{CoreError, CoreResult};

/// What was removed alongside a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub images_removed: usize,
    pub bookings_removed: u64,
}

/// Field use cases: creation with images, listing, owner-guarded changes
/// and availability search.
pub struct FieldManager {
    fields: Arc<dyn FieldRepository>,
    images: Arc<dyn ImageRepository>,
    bookings: Arc<dyn BookingRepository>,
    media: Arc<dyn MediaStore>,
}

impl FieldManager {
    pub fn new(
        fields: Arc<dyn FieldRepository>,
        images: Arc<dyn ImageRepository>,
        bookings: Arc<dyn BookingRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            fields,
            images,
            bookings,
            media,
        }
    }

    pub async fn create_field(
        &self,
        owner: &User,
        draft: FieldDraft,
        uploads: Vec<Upload>,
    ) -> CoreResult<FieldListing> {
        let draft = draft.validate()?;
        for upload in &uploads {
            upload.validate()?;
        }

        let field = self.fields.create_field(Some(owner.id), &draft).await?;
        let mut images = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            let path = self.media.save(upload).await?;
            images.push(self.images.add_image(field.id, &upload.file_name, &path).await?);
        }

        info!(
            "Field {} created by {} with {} image(s)",
            field.id,
            owner.username,
            images.len()
        );
        Ok(FieldListing { field, images })
    }

    pub async fn list_fields(&self) -> CoreResult<Vec<FieldListing>> {
        let fields = self.fields.list_fields().await?;
        self.attach_images(fields).await
    }

    pub async fn get_field(&self, id: i64) -> CoreResult<FieldListing> {
        let field = self.require_field(id).await?;
        let mut listings = self.attach_images(vec![field]).await?;
        listings
            .pop()
            .ok_or_else(|| CoreError::NotFound(format!("Field {}", id)))
    }

    pub async fn update_field(&self, actor: &User, id: i64, draft: FieldDraft) -> CoreResult<FieldListing> {
        let field = self.require_field(id).await?;
        if !field.is_managed_by(actor) {
            return Err(CoreError::PermissionDenied(
                "only the field owner or an admin may change this field".to_string(),
            ));
        }
        let draft = draft.validate()?;
        let updated = self
            .fields
            .update_field(id, &draft)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Field {}", id)))?;
        info!("Field {} updated by {}", id, actor.username);
        let mut listings = self.attach_images(vec![updated]).await?;
        listings
            .pop()
            .ok_or_else(|| CoreError::NotFound(format!("Field {}", id)))
    }

    pub async fn delete_field(&self, actor: &User, id: i64) -> CoreResult<CascadeReport> {
        let field = self.require_field(id).await?;
        if !field.is_managed_by(actor) {
            return Err(CoreError::PermissionDenied(
                "only the field owner or an admin may delete this field".to_string(),
            ));
        }

        let removal = self
            .fields
            .delete_field(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Field {}", id)))?;
        self.remove_media(&removal.images).await;

        let report = CascadeReport {
            images_removed: removal.images.len(),
            bookings_removed: removal.bookings_removed,
        };
        info!(
            "Field {} deleted by {} ({} image(s), {} booking(s) removed)",
            id, actor.username, report.images_removed, report.bookings_removed
        );
        Ok(report)
    }

    /// Runs after the rows are committed. Failures are logged and skipped.
    async fn remove_media(&self, images: &[Image]) {
        for image in images {
            if let Err(e) = self.media.remove(&image.path).await {
                warn!("Could not remove media file {}: {}", image.path, e);
            }
        }
    }

    pub async fn available_fields(&self, query: &AvailabilityQuery) -> CoreResult<Vec<FieldListing>> {
        let window = query.window()?;
        let observer = query.observer();

        let fields = self.fields.list_fields().await?;
        let bookings = match &window {
            Some(window) => self.bookings.list_on_date(window.date).await?,
            None => Vec::new(),
        };

        let available = filter_available(fields, &bookings, window.as_ref(), observer.as_ref());
        self.attach_images(available).await
    }

    async fn require_field(&self, id: i64) -> CoreResult<Field> {
        self.fields
            .get_field(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Field {}", id)))
    }

    async fn attach_images(&self, fields: Vec<Field>) -> CoreResult<Vec<FieldListing>> {
        let ids: Vec<i64> = fields.iter().map(|f| f.id).collect();
        let mut by_field: HashMap<i64, Vec<Image>> = HashMap::new();
        for image in self.images.list_for_fields(&ids).await? {
            by_field.entry(image.field_id).or_default().push(image);
        }
        Ok(fields
            .into_iter()
            .map(|field| {
                let images = by_field.remove(&field.id).unwrap_or_default();
                FieldListing { field, images }
            })
            .collect())
    }
}

/// Booking use cases. The overlap check itself runs inside the repository
/// write so it shares the write's lock.
pub struct BookingManager {
    bookings: Arc<dyn BookingRepository>,
    fields: Arc<dyn FieldRepository>,
}

impl BookingManager {
    pub fn new(bookings: Arc<dyn BookingRepository>, fields: Arc<dyn FieldRepository>) -> Self {
        Self { bookings, fields }
    }

    pub async fn create_booking(&self, actor: &User, draft: BookingDraft) -> CoreResult<Booking> {
        let candidate = draft.candidate()?;
        self.require_bookable_field(candidate.field_id).await?;

        let booking = self.bookings.create_booking(actor.id, &candidate).await?;
        info!(
            "Booking {} created: field {} on {} {}-{} by {}",
            booking.id,
            booking.field_id,
            booking.booking_date,
            booking.start_time,
            booking.end_time,
            actor.username
        );
        Ok(booking)
    }

    pub async fn list_bookings(&self) -> CoreResult<Vec<Booking>> {
        self.bookings.list_bookings().await
    }

    pub async fn get_booking(&self, id: i64) -> CoreResult<Booking> {
        self.bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))
    }

    /// Allowed for the booker, the field owner and admins.
    pub async fn update_booking(&self, actor: &User, id: i64, draft: BookingDraft) -> CoreResult<Booking> {
        let existing = self.get_booking(id).await?;
        let field = self.fields.get_field(existing.field_id).await?;
        let owns_field = field.map(|f| f.is_managed_by(actor)).unwrap_or(false);
        if existing.user_id != actor.id && !owns_field && !actor.is_admin() {
            return Err(CoreError::PermissionDenied(
                "only the booker, the field owner or an admin may change this booking".to_string(),
            ));
        }

        let candidate = draft.candidate()?.excluding(id);
        self.require_bookable_field(candidate.field_id).await?;

        let booking = self
            .bookings
            .update_booking(id, &candidate)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))?;
        info!("Booking {} updated by {}", id, actor.username);
        Ok(booking)
    }

    /// Allowed for the field owner and admins only.
    pub async fn delete_booking(&self, actor: &User, id: i64) -> CoreResult<()> {
        let existing = self.get_booking(id).await?;
        let field = self.fields.get_field(existing.field_id).await?;
        let permitted = actor.is_admin()
            || field.map(|f| f.owner == Some(actor.id)).unwrap_or(false);
        if !permitted {
            return Err(CoreError::PermissionDenied(
                "only the field owner or an admin may delete this booking".to_string(),
            ));
        }

        if !self.bookings.delete_booking(id).await? {
            return Err(CoreError::NotFound(format!("Booking {}", id)));
        }
        info!("Booking {} deleted by {}", id, actor.username);
        Ok(())
    }

    async fn require_bookable_field(&self, field_id: i64) -> CoreResult<()> {
        match self.fields.get_field(field_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::ValidationError(format!(
                "Invalid field \"{}\" - object does not exist.",
                field_id
            ))),
        }
    }
}
