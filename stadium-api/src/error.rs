use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stadium_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::ValidationConflict(msg) => AppError::ValidationError(msg),
            err @ CoreError::ParseError { .. } => AppError::ValidationError(err.to_string()),
            err @ CoreError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CoreError::PermissionDenied(msg) => AppError::AuthorizationError(msg),
            CoreError::Unauthenticated(msg) => AppError::AuthenticationError(msg),
            CoreError::StorageError(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::ValidationError(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = vec![
            (CoreError::ValidationConflict("taken".into()), StatusCode::BAD_REQUEST),
            (
                CoreError::ParseError { kind: "time", value: "25:99".into(), pattern: "HH:MM" },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NotFound("Field 1".into()), StatusCode::NOT_FOUND),
            (CoreError::PermissionDenied("no".into()), StatusCode::FORBIDDEN),
            (CoreError::Unauthenticated("no".into()), StatusCode::UNAUTHORIZED),
            (CoreError::StorageError("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_parse_error_message_names_value() {
        let err = AppError::from(CoreError::ParseError { kind: "time", value: "25:99".into(), pattern: "HH:MM" });
        assert_eq!(err.to_string(), "Invalid time format: '25:99'. Must be in 'HH:MM' format.");
    }
}
