//! # packcalc-api — HTTP Service for the Order Pack Calculator
//!
//! Exposes the packing engine and pack-size store from `packcalc-core`
//! over a JSON API, with Prometheus metrics, an OpenAPI document and an
//! embedded browser UI.
//!
//! ## API Surface
//!
//! | Path               | Module                    | Purpose                 |
//! |--------------------|---------------------------|-------------------------|
//! | `/api/health`      | [`routes::health`]        | Liveness probe          |
//! | `/api/pack-sizes`  | [`routes::pack_sizes`]    | Read/replace pack sizes |
//! | `/api/calculate`   | [`routes::calculate`]     | Pack distribution       |
//! | `/metrics`         | this module               | Prometheus scrape       |
//! | `/openapi.json`    | [`openapi`]               | OpenAPI document        |
//! | `/`                | [`routes::ui`]            | Browser UI              |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! SetRequestId → Trace → PropagateRequestId → CatchPanic → CORS → Timeout
//!   → Metrics → RateLimit (pack-size and calculate routes only) → Handler
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

use std::any::Any;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::error::AppError;
use crate::middleware::rate_limit::RateLimiter;
use crate::middleware::request_id::{self, X_REQUEST_ID};
use crate::state::AppState;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();
    let limiter = RateLimiter::new(state.rate_limit_config());

    let mut api = Router::new()
        .merge(routes::pack_sizes::router())
        .merge(routes::calculate::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if limiter.is_enabled() {
        api = api
            .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
            .layer(Extension(limiter));
    }

    let mut app = Router::new()
        .merge(routes::health::router())
        .merge(api)
        .merge(openapi::router())
        .merge(routes::ui::router());

    if config.metrics_enabled {
        app = app
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(state.metrics.clone()));
    }

    let mut app = app
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(request_id::propagate_layer());

    if config.enable_request_logging {
        app = app.layer(middleware::tracing_layer::layer());
    }

    app.layer(request_id::set_layer())
}

/// CORS policy for browser clients on other origins.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([X_REQUEST_ID])
        .max_age(Duration::from_secs(86_400))
}

/// Convert a handler panic into the standard 500 error body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Refreshes the configured pack-size gauge from the store, then gathers
/// and encodes all metrics in Prometheus text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    state
        .metrics
        .set_pack_sizes_configured(state.store.read().len());

    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
