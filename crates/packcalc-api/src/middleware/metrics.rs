//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Calculation and pack-size metrics are recorded by the
//! handlers. The configured pack-size gauge is refreshed on each `/metrics`
//! scrape (pull model); see the metrics handler in `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Outcome label for `packcalc_calculations_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationOutcome {
    Success,
    CannotFulfill,
    InvalidInput,
    Error,
}

impl CalculationOutcome {
    fn as_label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::CannotFulfill => "cannot_fulfill",
            Self::InvalidInput => "invalid_input",
            Self::Error => "error",
        }
    }
}

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain metrics --
    calculations_total: IntCounterVec,
    calculation_duration_seconds: Histogram,
    pack_size_updates_total: IntCounter,

    // -- Pull model, updated on /metrics scrape --
    pack_sizes_configured: IntGauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("packcalc_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "packcalc_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )?;

        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "packcalc_http_errors_total",
                "Total HTTP errors (4xx and 5xx)",
            ),
            &["method", "path", "status"],
        )?;

        let calculations_total = IntCounterVec::new(
            Opts::new(
                "packcalc_calculations_total",
                "Pack calculations by outcome",
            ),
            &["outcome"],
        )?;

        let calculation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "packcalc_calculation_duration_seconds",
                "Time spent inside the packing engine",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
            ]),
        )?;

        let pack_size_updates_total = IntCounter::new(
            "packcalc_pack_size_updates_total",
            "Successful pack-size replacements",
        )?;

        let pack_sizes_configured = IntGauge::new(
            "packcalc_pack_sizes_configured",
            "Number of pack sizes currently configured",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(calculations_total.clone()))?;
        registry.register(Box::new(calculation_duration_seconds.clone()))?;
        registry.register(Box::new(pack_size_updates_total.clone()))?;
        registry.register(Box::new(pack_sizes_configured.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                calculations_total,
                calculation_duration_seconds,
                pack_size_updates_total,
                pack_sizes_configured,
            }),
        })
    }

    /// Current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    /// Calculations recorded with `outcome`.
    pub fn calculations(&self, outcome: CalculationOutcome) -> u64 {
        self.inner
            .calculations_total
            .with_label_values(&[outcome.as_label()])
            .get()
    }

    /// Successful pack-size replacements so far.
    pub fn pack_size_updates(&self) -> u64 {
        self.inner.pack_size_updates_total.get()
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Record one pass through the packing engine.
    pub fn record_calculation(&self, outcome: CalculationOutcome, duration_secs: f64) {
        self.inner
            .calculations_total
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.inner.calculation_duration_seconds.observe(duration_secs);
    }

    /// Record a committed pack-size replacement.
    pub fn record_pack_size_update(&self, configured: usize) {
        self.inner.pack_size_updates_total.inc();
        self.set_pack_sizes_configured(configured);
    }

    /// Set the configured pack-size gauge.
    pub fn set_pack_sizes_configured(&self, configured: usize) {
        self.inner
            .pack_sizes_configured
            .set(i64::try_from(configured).unwrap_or(i64::MAX));
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Collapse a request path to a bounded label set.
///
/// Unknown paths share one label so that scanners cannot grow the series
/// count without bound.
fn metric_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/api/health" => "/api/health",
        "/api/pack-sizes" => "/api/pack-sizes",
        "/api/calculate" => "/api/calculate",
        "/metrics" => "/metrics",
        "/openapi.json" => "/openapi.json",
        _ => "other",
    }
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = metric_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, path, response.status().as_u16(), duration);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> ApiMetrics {
        ApiMetrics::new().unwrap()
    }

    #[test]
    fn api_metrics_new_starts_at_zero() {
        let m = metrics();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
        assert_eq!(m.pack_size_updates(), 0);
        assert_eq!(m.calculations(CalculationOutcome::Success), 0);
    }

    #[test]
    fn requests_increments() {
        let m = metrics();
        m.record_request("GET", "/api/health", 200, 0.01);
        m.record_request("POST", "/api/calculate", 200, 0.02);
        m.record_request("GET", "/api/pack-sizes", 200, 0.005);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn errors_count_4xx_and_5xx() {
        let m = metrics();
        m.record_request("POST", "/api/calculate", 422, 0.1);
        m.record_request("POST", "/api/calculate", 500, 0.1);
        m.record_request("POST", "/api/calculate", 200, 0.1);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn calculations_tracked_by_outcome() {
        let m = metrics();
        m.record_calculation(CalculationOutcome::Success, 0.001);
        m.record_calculation(CalculationOutcome::Success, 0.002);
        m.record_calculation(CalculationOutcome::CannotFulfill, 0.001);
        assert_eq!(m.calculations(CalculationOutcome::Success), 2);
        assert_eq!(m.calculations(CalculationOutcome::CannotFulfill), 1);
        assert_eq!(m.calculations(CalculationOutcome::Error), 0);
    }

    #[test]
    fn pack_size_update_sets_gauge() {
        let m = metrics();
        m.record_pack_size_update(3);
        assert_eq!(m.pack_size_updates(), 1);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("packcalc_pack_sizes_configured 3"));
        assert!(text.contains("packcalc_pack_size_updates_total 1"));
    }

    #[test]
    fn encoded_output_names_metrics() {
        let m = metrics();
        m.record_request("GET", "/api/health", 200, 0.01);
        m.record_calculation(CalculationOutcome::InvalidInput, 0.0);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("packcalc_http_requests_total"));
        assert!(text.contains("packcalc_http_request_duration_seconds"));
        assert!(text.contains("packcalc_calculations_total{outcome=\"invalid_input\"} 1"));
    }

    #[test]
    fn metric_path_bounds_cardinality() {
        assert_eq!(metric_path("/api/calculate"), "/api/calculate");
        assert_eq!(metric_path("/wp-admin/setup.php"), "other");
        assert_eq!(metric_path("/api/calculate/extra"), "other");
    }

    #[test]
    fn registries_are_independent() {
        let a = metrics();
        let b = metrics();
        a.record_request("GET", "/", 200, 0.0);
        assert_eq!(a.requests(), 1);
        assert_eq!(b.requests(), 0);
    }
}
