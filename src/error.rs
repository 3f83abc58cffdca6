// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already a member of this club")]
    AlreadyMember,

    #[error("Join request already pending")]
    RequestPending,

    #[error("User is not pending approval")]
    NotPending,

    #[error("Already checked in to this event")]
    DuplicateCheckIn,

    #[error("Location is required to check in to this event")]
    LocationRequired,

    #[error("No check-in location has been configured for this club")]
    NoAnchorConfigured,

    #[error("Not within the check-in radius ({distance_feet:.1} ft away, limit {radius_feet:.1} ft)")]
    OutOfRange {
        distance_feet: f64,
        radius_feet: f64,
    },

    #[error("This event is not open for check-in")]
    NoActiveEvent,

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Ownership must be transferred first: {0}")]
    OwnershipRequired(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Stable machine-readable error kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::AlreadyMember => "already_member",
            AppError::RequestPending => "request_pending",
            AppError::NotPending => "not_pending",
            AppError::DuplicateCheckIn => "duplicate_check_in",
            AppError::LocationRequired => "location_required",
            AppError::NoAnchorConfigured => "no_anchor_configured",
            AppError::OutOfRange { .. } => "out_of_range",
            AppError::NoActiveEvent => "no_active_event",
            AppError::InvalidCoordinate(_) => "invalid_coordinate",
            AppError::OwnershipRequired(_) => "ownership_required",
            AppError::InvalidOperation(_) => "invalid_operation",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) | AppError::OutOfRange { .. } => StatusCode::FORBIDDEN,
            AppError::OwnershipRequired(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        // Storage and internal failures are logged server-side and return a
        // generic body; everything else carries its human-readable message.
        let details = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: kind.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
