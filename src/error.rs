//! Error types for Equiplab server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 5,
    Duplicate = 6,
    BadValue = 7,
    InvalidRange = 10,
    TooShort = 11,
    NotAssigned = 12,
    TimeConflict = 13,
    HasActiveBookings = 14,
    SlotUnavailable = 15,
    OutOfBounds = 16,
    BookingConflict = 17,
}

/// Rule violations raised by slot and booking scheduling.
///
/// These are always recoverable and reported back to the caller. Conflict kinds
/// (`TimeConflict`, `BookingConflict`, `SlotUnavailable`) may be retried with
/// different input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Start time must be earlier than end time")]
    InvalidRange,

    #[error("Minimum duration is 15 minutes")]
    TooShort,

    #[error("Equipment not found or not assigned to you")]
    NotAssigned,

    #[error("Time conflicts with an existing slot")]
    TimeConflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Cannot delete a slot with active bookings")]
    HasActiveBookings,

    #[error("Slot is not available")]
    SlotUnavailable,

    #[error("Booking time must lie within the slot")]
    OutOfBounds,

    #[error("Requested time overlaps an existing booking")]
    BookingConflict,
}

impl SchedulingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SchedulingError::InvalidRange => ErrorCode::InvalidRange,
            SchedulingError::TooShort => ErrorCode::TooShort,
            SchedulingError::NotAssigned => ErrorCode::NotAssigned,
            SchedulingError::TimeConflict => ErrorCode::TimeConflict,
            SchedulingError::NotFound(_) => ErrorCode::NoSuchData,
            SchedulingError::HasActiveBookings => ErrorCode::HasActiveBookings,
            SchedulingError::SlotUnavailable => ErrorCode::SlotUnavailable,
            SchedulingError::OutOfBounds => ErrorCode::OutOfBounds,
            SchedulingError::BookingConflict => ErrorCode::BookingConflict,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Scheduling(e) => (e.status(), e.code(), e.to_string()),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
