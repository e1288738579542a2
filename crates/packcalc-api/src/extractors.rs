//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers that turn
//! JSON extraction failures into [`AppError`] values.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types with rules beyond what serde checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping every rejection to [`AppError::BadRequest`].
///
/// Handlers take `Result<Json<T>, JsonRejection>` so that malformed bodies,
/// wrong field types, oversized bodies and a missing content type all
/// surface as a 400 with the service's own error body:
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| {
        AppError::BadRequest(format!("{} ({})", err.body_text(), err.status()))
    })
}

/// Extract a JSON body and validate it, reporting rule violations as
/// [`AppError::Validation`].
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    extract_validated_json_as(result, AppError::Validation)
}

/// Like [`extract_validated_json`], with the error variant for rule
/// violations chosen by the caller.
pub fn extract_validated_json_as<T, F>(
    result: Result<Json<T>, JsonRejection>,
    on_invalid: F,
) -> Result<T, AppError>
where
    T: Validate,
    F: FnOnce(String) -> AppError,
{
    let value = extract_json(result)?;
    value.validate().map_err(on_invalid)?;
    Ok(value)
}
