use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use busline_core::LedgerError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidInput(msg) => AppError::ValidationError(msg),
            e @ LedgerError::NotFound { .. } => AppError::NotFoundError(e.to_string()),
            LedgerError::InsufficientCapacity { .. } => {
                AppError::ValidationError("Not enough available seats".to_string())
            }
            e @ LedgerError::ConflictRetryExhausted { .. } => {
                AppError::ConflictError(e.to_string())
            }
            e @ LedgerError::Storage(_) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// `Json` whose rejections render as `{"error": ...}` 400 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_status() {
        let cases = [
            (LedgerError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                LedgerError::NotFound { entity: "Booking", id: "b-1".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                LedgerError::InsufficientCapacity { requested: 2, available: 1 },
                StatusCode::BAD_REQUEST,
            ),
            (LedgerError::ConflictRetryExhausted { attempts: 8 }, StatusCode::CONFLICT),
            (LedgerError::Storage("pool timed out".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
