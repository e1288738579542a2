//! # Calculation API
//!
//! `POST /api/calculate` reads a snapshot of the current pack sizes and runs
//! the packing engine on the blocking pool. The engine allocates tables
//! proportional to `items`, so `items` is capped by `max_items` first.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use packcalc_core::{PackDistribution, PackingError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::middleware::metrics::CalculationOutcome;
use crate::state::AppState;

/// Order to pack.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CalculateRequest {
    /// Number of items ordered. Must be positive.
    pub items: i64,
}

impl Validate for CalculateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.items <= 0 {
            return Err(format!("items must be a positive integer, got {}", self.items));
        }
        Ok(())
    }
}

/// Minimal exact distribution for an order.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub items: i64,
    /// Pack size (as a string key) to number of packs of that size.
    #[schema(value_type = Object, example = json!({"250": 1, "500": 1}))]
    pub packs: PackDistribution,
    pub total_packs: u64,
    pub total_items: i64,
    /// Always zero for a successful calculation.
    pub remainder: i64,
    /// Wall time spent in the packing engine.
    pub calculation_time_ms: u64,
}

/// Build the calculation router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/calculate", post(calculate))
}

/// POST /api/calculate — Compute the fewest packs that hold exactly `items`.
#[utoipa::path(
    post,
    path = "/api/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Minimal exact distribution", body = CalculateResponse),
        (status = 400, description = "Malformed body or item count out of range", body = ErrorBody),
        (status = 422, description = "No combination of pack sizes sums to the item count", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "calculate"
)]
async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, AppError> {
    let req = match extract_validated_json(body) {
        Ok(req) => req,
        Err(err) => {
            state
                .metrics
                .record_calculation(CalculationOutcome::InvalidInput, 0.0);
            return Err(err);
        }
    };
    let items = req.items;
    if items > state.config.max_items {
        state
            .metrics
            .record_calculation(CalculationOutcome::InvalidInput, 0.0);
        return Err(AppError::Validation(format!(
            "items must not exceed {}, got {items}",
            state.config.max_items
        )));
    }

    let pack_sizes = state.store.read();
    let calculator = Arc::clone(&state.calculator);
    let start = Instant::now();
    let outcome =
        tokio::task::spawn_blocking(move || calculator.calculate_packs(items, pack_sizes.as_slice()))
            .await;
    let elapsed = start.elapsed();

    let result = match outcome {
        Ok(result) => result,
        Err(join_err) => {
            state
                .metrics
                .record_calculation(CalculationOutcome::Error, elapsed.as_secs_f64());
            return Err(AppError::Internal(format!(
                "calculation task failed: {join_err}"
            )));
        }
    };

    let label = match &result {
        Ok(_) => CalculationOutcome::Success,
        Err(PackingError::CannotFulfillExactly { .. }) => CalculationOutcome::CannotFulfill,
        Err(PackingError::InvalidPackSizes(_)) => CalculationOutcome::Error,
        Err(e) if e.is_input_error() => CalculationOutcome::InvalidInput,
        Err(_) => CalculationOutcome::Error,
    };
    state.metrics.record_calculation(label, elapsed.as_secs_f64());

    let packs = result.map_err(|err| {
        tracing::debug!(items, error = %err, "calculation rejected");
        AppError::from_calculation(err)
    })?;

    Ok(Json(CalculateResponse {
        items,
        total_packs: packs.total_packs(),
        total_items: packs.total_items(),
        remainder: packs.remainder(items),
        calculation_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        packs,
    }))
}
