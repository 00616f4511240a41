use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stadium_core::{PublicUser, Registration, Role};
use stadium_shared::Masked;
use tracing::info;

use crate::{
    error::AppError,
    middleware::{issue_token, CurrentUser},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: Masked<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    username: String,
    role: Role,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register/", post(register))
        .route("/api/auth/login/", post(login))
}

/// Routes that sit behind `require_user`.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/auth/logout/", post(logout))
}

async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = state.accounts.register(registration).await?;
    Ok((StatusCode::CREATED, Json(user.public())))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .accounts
        .authenticate(&req.username, req.password.expose())
        .await?
        .ok_or_else(|| AppError::AuthenticationError("invalid username or password".to_string()))?;

    let session = state.accounts.open_session(&user, state.auth.expiration).await?;
    let token = issue_token(&state.auth, &user, &session)?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Value>, AppError> {
    state.accounts.close_session(current.session_id).await?;
    info!(user_id = current.user.id, "User logged out");
    Ok(Json(json!({ "detail": "Logged out successfully" })))
}
