use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stadium_core::{Session, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    /// Session id; the token is only honoured while the session exists.
    pub jti: String,
    pub role: String,
    pub exp: usize,
}

/// The authenticated caller, scoped to one request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

pub fn issue_token(auth: &AuthConfig, user: &User, session: &Session) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        jti: session.id.to_string(),
        role: user.role.to_string(),
        exp: session.expires_at.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn decode_token(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("Invalid token.".to_string()))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn require_user(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from Authorization header
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::AuthenticationError("Authentication credentials were not provided.".to_string())
    })?;

    // 2. Decode and validate JWT
    let claims = decode_token(&state.auth, bearer.token())?;
    let session_id = Uuid::parse_str(&claims.jti)
        .map_err(|_| AppError::AuthenticationError("Invalid token.".to_string()))?;

    // 3. The session must still exist and belong to the token's subject
    let user = state.accounts.resolve_session(session_id).await?;
    if user.id.to_string() != claims.sub {
        return Err(AppError::AuthenticationError("Invalid token.".to_string()));
    }

    // 4. Inject the caller into request extensions
    req.extensions_mut().insert(CurrentUser { user, session_id });

    Ok(next.run(req).await)
}
