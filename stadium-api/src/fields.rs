use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use stadium_core::{FieldDraft, FieldListing, Upload};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{error::AppError, middleware::CurrentUser, state::{AppState, MediaSettings}};

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub id: i64,
    pub owner: Option<i64>,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub hourly_rate: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<ImageResponse>,
}

impl FieldResponse {
    pub fn from_listing(listing: FieldListing, media: &MediaSettings) -> Self {
        let FieldListing { field, images } = listing;
        Self {
            id: field.id,
            owner: field.owner,
            name: field.name,
            address: field.address,
            contact: field.contact,
            hourly_rate: field.hourly_rate,
            latitude: field.latitude,
            longitude: field.longitude,
            images: images
                .into_iter()
                .map(|image| ImageResponse { path: media.url_for(&image.path), name: image.name })
                .collect(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stadium/list", get(list_fields))
        .route("/api/stadium/detail/{id}", get(get_field))
}

pub fn protected_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/stadium/create/",
            post(create_field).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/stadium/update/{id}", put(update_field))
        .route("/api/stadium/delete/{id}", delete(delete_field))
}

async fn list_fields(State(state): State<AppState>) -> Result<Json<Vec<FieldResponse>>, AppError> {
    let listings = state.fields.list_fields().await?;
    Ok(Json(
        listings
            .into_iter()
            .map(|listing| FieldResponse::from_listing(listing, &state.media))
            .collect(),
    ))
}

async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FieldResponse>, AppError> {
    let listing = state.fields.get_field(id).await?;
    Ok(Json(FieldResponse::from_listing(listing, &state.media)))
}

async fn create_field(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FieldResponse>), AppError> {
    let mut form: HashMap<String, String> = HashMap::new();
    let mut uploads = Vec::new();

    while let Some(part) = multipart.next_field().await? {
        let name = part.name().unwrap_or_default().to_string();
        if name == "images" {
            let file_name = part.file_name().unwrap_or("upload").to_string();
            let bytes = part.bytes().await?;
            uploads.push(Upload::new(file_name, bytes.to_vec()));
        } else {
            let text = part.text().await?;
            form.insert(name, text);
        }
    }
    debug!(uploads = uploads.len(), "Parsed field form");

    let draft = draft_from_form(&form)?;
    let listing = state.fields.create_field(&current.user, draft, uploads).await?;

    Ok((StatusCode::CREATED, Json(FieldResponse::from_listing(listing, &state.media))))
}

async fn update_field(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(draft): Json<FieldDraft>,
) -> Result<Json<FieldResponse>, AppError> {
    let listing = state.fields.update_field(&current.user, id, draft).await?;
    Ok(Json(FieldResponse::from_listing(listing, &state.media)))
}

async fn delete_field(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let report = state.fields.delete_field(&current.user, id).await?;
    info!(
        field_id = id,
        images = report.images_removed,
        bookings = report.bookings_removed,
        "Field removed with dependents"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn draft_from_form(form: &HashMap<String, String>) -> Result<FieldDraft, AppError> {
    Ok(FieldDraft {
        name: required_text(form, "name")?,
        address: required_text(form, "address")?,
        contact: required_text(form, "contact")?,
        hourly_rate: required_number(form, "hourly_rate")?,
        latitude: required_number(form, "latitude")?,
        longitude: required_number(form, "longitude")?,
    })
}

fn required_text(form: &HashMap<String, String>, key: &str) -> Result<String, AppError> {
    form.get(key)
        .cloned()
        .ok_or_else(|| AppError::ValidationError(format!("{}: This field is required.", key)))
}

fn required_number(form: &HashMap<String, String>, key: &str) -> Result<f64, AppError> {
    let raw = required_text(form, key)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AppError::ValidationError(format!("{}: A valid number is required.", key)))
}
