//! # HTTP Middleware
//!
//! Request IDs, tracing, Prometheus metrics and per-client rate limiting.

pub mod metrics;
pub mod rate_limit;
pub mod request_id;
pub mod tracing_layer;
