//! # Pack-Size Configuration API
//!
//! Read and replace the pack sizes used by every subsequent calculation.
//! Replacement is all-or-nothing: an invalid list leaves the current set
//! in place.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json_as, Validate};
use crate::state::AppState;

/// Replacement pack-size list.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackSizesRequest {
    /// Positive pack sizes in any order; duplicates are collapsed.
    pub pack_sizes: Vec<i64>,
}

impl Validate for UpdatePackSizesRequest {
    fn validate(&self) -> Result<(), String> {
        if self.pack_sizes.is_empty() {
            return Err("packSizes must contain at least one size".to_string());
        }
        Ok(())
    }
}

/// Current pack-size configuration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackSizesResponse {
    /// Distinct sizes in ascending order.
    pub pack_sizes: Vec<i64>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Build the pack-size router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/pack-sizes",
        get(get_pack_sizes).put(update_pack_sizes),
    )
}

/// GET /api/pack-sizes — Current pack sizes.
#[utoipa::path(
    get,
    path = "/api/pack-sizes",
    responses(
        (status = 200, description = "Current pack sizes", body = PackSizesResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "pack-sizes"
)]
async fn get_pack_sizes(State(state): State<AppState>) -> Json<PackSizesResponse> {
    Json(PackSizesResponse {
        pack_sizes: state.store.read().to_vec(),
        updated_at: state.pack_sizes_updated_at(),
        message: None,
    })
}

/// PUT /api/pack-sizes — Replace the pack sizes.
#[utoipa::path(
    put,
    path = "/api/pack-sizes",
    request_body = UpdatePackSizesRequest,
    responses(
        (status = 200, description = "Pack sizes replaced", body = PackSizesResponse),
        (status = 400, description = "Malformed body or invalid pack sizes", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "pack-sizes"
)]
async fn update_pack_sizes(
    State(state): State<AppState>,
    body: Result<Json<UpdatePackSizesRequest>, JsonRejection>,
) -> Result<Json<PackSizesResponse>, AppError> {
    let req = extract_validated_json_as(body, AppError::InvalidPackSizes)?;

    let committed = state
        .store
        .replace(&req.pack_sizes)
        .map_err(AppError::from_update)?;
    let updated_at = state.mark_pack_sizes_updated();
    state.metrics.record_pack_size_update(committed.len());

    tracing::info!(pack_sizes = %committed, "pack sizes updated");

    Ok(Json(PackSizesResponse {
        pack_sizes: committed.to_vec(),
        updated_at,
        message: Some("Pack sizes updated successfully".to_string()),
    }))
}
