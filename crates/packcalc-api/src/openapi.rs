//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Pack Calculator API",
        version = "0.1.0",
        description = "Computes the fewest fixed-size packs that hold exactly the ordered number of items, and manages the configured pack sizes.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::health::health,
        crate::routes::pack_sizes::get_pack_sizes,
        crate::routes::pack_sizes::update_pack_sizes,
        crate::routes::calculate::calculate,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::pack_sizes::UpdatePackSizesRequest,
        crate::routes::pack_sizes::PackSizesResponse,
        crate::routes::calculate::CalculateRequest,
        crate::routes::calculate::CalculateResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "pack-sizes", description = "Pack-size configuration"),
        (name = "calculate", description = "Pack distribution"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
