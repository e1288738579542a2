//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`PackingError`] from packcalc-core to HTTP status codes and
//! returns JSON bodies with a code, a message, optional details and an
//! optional suggestion. Internal error details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use packcalc_core::PackingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Hint returned alongside an infeasible calculation of `items`.
pub fn cannot_fulfill_suggestion(items: i64) -> String {
    format!("Consider adding a pack size that divides {items} or adjust the order quantity")
}

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "CANNOT_FULFILL").
    pub code: String,
    /// Short human-readable summary.
    pub message: String,
    /// Underlying cause, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// What the caller can change to make the request succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request parsed but a field is out of range (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Submitted pack-size list was rejected (400).
    #[error("invalid pack sizes: {0}")]
    InvalidPackSizes(String),

    /// No combination of the configured pack sizes sums exactly to the order (422).
    #[error("cannot pack {items} items exactly: {reason}")]
    CannotFulfill { items: i64, reason: String },

    /// Client exceeded its request budget (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::InvalidPackSizes(_) => (StatusCode::BAD_REQUEST, "INVALID_PACK_SIZES"),
            Self::CannotFulfill { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "CANNOT_FULFILL"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Invalid request body",
            Self::Validation(_) => "Invalid request",
            Self::InvalidPackSizes(_) => "Invalid pack sizes",
            Self::CannotFulfill { .. } => "Cannot pack exactly",
            Self::RateLimited => "Too many requests",
            Self::Internal(_) => "An internal error occurred",
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::BadRequest(d) | Self::Validation(d) | Self::InvalidPackSizes(d) => {
                Some(d.clone())
            }
            Self::CannotFulfill { reason, .. } => Some(reason.clone()),
            Self::RateLimited | Self::Internal(_) => None,
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Self::CannotFulfill { items, .. } => Some(cannot_fulfill_suggestion(*items)),
            Self::RateLimited => Some("Retry after a short delay".to_string()),
            _ => None,
        }
    }

    /// Map an engine failure from `POST /api/calculate`.
    ///
    /// Pack sizes come from the store, which validates on write, so an
    /// `InvalidPackSizes` here is a server-side fault.
    pub fn from_calculation(err: PackingError) -> Self {
        match err {
            PackingError::InvalidItemCount(_) | PackingError::CapacityExceeded { .. } => {
                Self::Validation(err.to_string())
            }
            PackingError::CannotFulfillExactly { items } => Self::CannotFulfill {
                items,
                reason: err.to_string(),
            },
            PackingError::InvalidPackSizes(_) => {
                Self::Internal(format!("stored pack sizes rejected by calculator: {err}"))
            }
            PackingError::Reconstruction { .. } => Self::Internal(err.to_string()),
        }
    }

    /// Map a store failure from `PUT /api/pack-sizes`.
    pub fn from_update(err: PackingError) -> Self {
        match err {
            PackingError::InvalidPackSizes(_) => Self::InvalidPackSizes(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }

    /// The JSON body this error renders as.
    pub fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.summary().to_string(),
                details: self.details(),
                suggestion: self.suggestion(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        (status, Json(self.body())).into_response()
    }
}
