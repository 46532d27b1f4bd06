//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Services return `Result<T, AppError>`; handlers hand the error straight
/// back to Axum, which renders it through the `IntoResponse` impl below.
///
/// # Error Categories
///
/// - **Storage Errors**: sqlx failures or backend faults (never shown to clients)
/// - **Authentication Errors**: missing or unknown API keys
/// - **Ownership Errors**: the actor does not own the resource being touched
/// - **Lifecycle Errors**: the document is not in the state the operation needs
/// - **Validation Errors**: malformed amounts, rates or request bodies
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A non-sqlx storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Referenced order, seller, wallet or withdrawal request is absent.
    ///
    /// Returns HTTP 404 Not Found. The String names what was missing.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed amount, rate or request data.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidArgument(String),

    /// The document is not in the lifecycle state the operation requires.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    InvalidState(String),

    /// The authenticated actor does not own the resource being mutated.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Not allowed to access this resource")]
    Unauthorized,

    /// The wallet's available balance does not cover the requested debit.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidApiKey` → 401 Unauthorized
/// - `Unauthorized` → 403 Forbidden
/// - `NotFound` → 404 Not Found
/// - `InvalidState` → 409 Conflict
/// - `InsufficientBalance` → 422 Unprocessable Entity
/// - `InvalidArgument` → 400 Bad Request
/// - `Database` / `Storage` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                self.to_string(),
            ),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized", self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state", self.to_string()),
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidArgument(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                self.to_string(),
            ),
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Storage(ref e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let cases = [
            (AppError::not_found("Order"), StatusCode::NOT_FOUND),
            (AppError::invalid_argument("bad"), StatusCode::BAD_REQUEST),
            (AppError::invalid_state("nope"), StatusCode::CONFLICT),
            (AppError::Unauthorized, StatusCode::FORBIDDEN),
            (AppError::InsufficientBalance, StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::InvalidApiKey, StatusCode::UNAUTHORIZED),
            (
                AppError::Storage("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn not_found_names_the_missing_document() {
        assert_eq!(AppError::not_found("Order").to_string(), "Order not found");
    }
}
