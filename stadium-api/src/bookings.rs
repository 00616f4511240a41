use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use stadium_core::{AvailabilityQuery, Booking, BookingDraft};

use crate::{error::AppError, fields::FieldResponse, middleware::CurrentUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stadium/book/filter/", get(filter_available))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stadium/book/create", post(create_booking))
        .route("/api/stadium/book/list/", get(list_bookings))
        .route("/api/stadium/book/detail/{id}", get(get_booking))
        .route("/api/stadium/book/update/{id}", put(update_booking))
        .route("/api/stadium/book/delete/{id}", delete(delete_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create_booking(&current.user, draft).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_bookings().await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(id).await?))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(draft): Json<BookingDraft>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.update_booking(&current.user, id, draft).await?;
    Ok(Json(booking))
}

async fn delete_booking(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.bookings.delete_booking(&current.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fields free for the requested window, nearest first when `lat`/`lon` are given.
async fn filter_available(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<FieldResponse>>, AppError> {
    let listings = state.fields.available_fields(&query).await?;
    Ok(Json(
        listings
            .into_iter()
            .map(|listing| FieldResponse::from_listing(listing, &state.media))
            .collect(),
    ))
}
