//! Error types for the ShareIt server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
///
/// Booking engine failures get a dedicated variant each, so callers and
/// tests can match on the exact rule that was violated.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("User with id {0} not found")]
    UserNotFound(i64),

    #[error("Item with id {0} not found")]
    ItemNotFound(i64),

    #[error("Booking with id {0} not found")]
    BookingNotFound(i64),

    #[error("Item {0} is not available for booking")]
    ItemUnavailable(i64),

    #[error("Owner cannot book their own item {0}")]
    OwnerCannotBookOwnItem(i64),

    #[error("Booking start must be strictly before its end")]
    InvalidDateRange,

    #[error("User {user_id} cannot manage booking {booking_id}")]
    NotItemOwner { user_id: i64, booking_id: i64 },

    #[error("User {user_id} has no access to booking {booking_id}")]
    AccessDenied { user_id: i64, booking_id: i64 },

    #[error("Booking {0} has already been decided")]
    StatusAlreadySet(i64),

    #[error("Unknown state: {0}")]
    UnsupportedState(String),

    #[error("User {user_id} has not completed a booking of item {item_id}")]
    CommentNotAllowed { user_id: i64, item_id: i64 },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UserNotFound(_) => "UserNotFound",
            AppError::ItemNotFound(_) => "ItemNotFound",
            AppError::BookingNotFound(_) => "BookingNotFound",
            AppError::ItemUnavailable(_) => "ItemUnavailable",
            AppError::OwnerCannotBookOwnItem(_) => "OwnerCannotBookOwnItem",
            AppError::InvalidDateRange => "InvalidDateRange",
            AppError::NotItemOwner { .. } => "NotItemOwner",
            AppError::AccessDenied { .. } => "AccessDenied",
            AppError::StatusAlreadySet(_) => "StatusAlreadySet",
            AppError::UnsupportedState(_) => "UnsupportedState",
            AppError::CommentNotAllowed { .. } => "CommentNotAllowed",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Validation(_) => "Validation",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Conflict(_) => "Conflict",
            AppError::Database(_) => "Database",
            AppError::Internal(_) => "Internal",
        }
    }

    /// HTTP status the error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound(_)
            | AppError::ItemNotFound(_)
            | AppError::BookingNotFound(_)
            | AppError::OwnerCannotBookOwnItem(_)
            | AppError::NotItemOwner { .. }
            | AppError::AccessDenied { .. } => StatusCode::NOT_FOUND,
            AppError::ItemUnavailable(_)
            | AppError::InvalidDateRange
            | AppError::StatusAlreadySet(_)
            | AppError::UnsupportedState(_)
            | AppError::CommentNotAllowed { .. }
            | AppError::Validation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!("Request rejected: {}", other);
                other.to_string()
            }
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
        });

        (self.status_code(), body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_rule_status_codes() {
        assert_eq!(AppError::OwnerCannotBookOwnItem(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::StatusAlreadySet(1).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::CommentNotAllowed { user_id: 1, item_id: 2 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("email".into()).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unsupported_state_message() {
        let err = AppError::UnsupportedState("UNSUPPORTED_STATUS".to_string());
        assert_eq!(err.to_string(), "Unknown state: UNSUPPORTED_STATUS");
        assert_eq!(err.kind(), "UnsupportedState");
    }
}
