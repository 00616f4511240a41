use serde::{Deserialize, Serialize};
use stadium_shared::GeoPoint;

use crate::identity::User;
use crate::{CoreError, CoreResult};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub owner: Option<i64>,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub hourly_rate: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Field {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Owners and admins may change or remove a field.
    pub fn is_managed_by(&self, user: &User) -> bool {
        user.is_admin() || self.owner == Some(user.id)
    }
}

/// Editable attributes of a field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDraft {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub hourly_rate: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl FieldDraft {
    /// Checks lengths and ranges and rounds the rate to cents.
    pub fn validate(mut self) -> CoreResult<Self> {
        self.name = require_text("name", self.name, 255)?;
        self.address = require_text("address", self.address, 255)?;
        self.contact = require_text("contact", self.contact, 100)?;

        // Range is checked on the stored (cent-rounded) value.
        let rate = (self.hourly_rate * 100.0).round() / 100.0;
        if !rate.is_finite() || rate < 0.0 || rate >= 10_000.0 {
            return Err(CoreError::ValidationError(
                "hourly_rate must be between 0 and 9999.99".to_string(),
            ));
        }
        self.hourly_rate = rate;

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::ValidationError(
                "latitude must be between -90 and 90".to_string(),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::ValidationError(
                "longitude must be between -180 and 180".to_string(),
            ));
        }
        Ok(self)
    }
}

fn require_text(name: &str, value: String, max_len: usize) -> CoreResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(CoreError::ValidationError(format!("{} may not be blank", name)));
    }
    if value.chars().count() > max_len {
        return Err(CoreError::ValidationError(format!(
            "{} must be at most {} characters",
            name, max_len
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub field_id: i64,
    pub name: String,
    /// Location relative to the media root.
    pub path: String,
}

/// A file received with a field-creation request.
#[derive(Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.bytes.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "The submitted file '{}' is empty.",
                self.file_name
            )));
        }
        match self.extension() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(CoreError::ValidationError(format!(
                "'{}' is not a supported image file.",
                self.file_name
            ))),
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A field together with its images.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldListing {
    pub field: Field,
    pub images: Vec<Image>,
}

/// Rows removed by an atomic field delete. The image files still need
/// removing from the media store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRemoval {
    pub images: Vec<Image>,
    pub bookings_removed: u64,
}
