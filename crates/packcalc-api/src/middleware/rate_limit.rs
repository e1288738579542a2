//! # Per-Client Rate Limiting
//!
//! In-memory token bucket keyed by client address. Each client starts with
//! `burst` tokens, spends one per request and regains `requests_per_second`
//! tokens per second up to `burst`.
//!
//! The client key is the first hop of `X-Forwarded-For`, then `X-Real-IP`,
//! then `"anonymous"`. The table of per-client buckets is capped; once
//! it is full and pruning frees nothing, unseen keys share one bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::AppError;

/// Buckets idle this long are dropped when the table is pruned.
const IDLE_EVICTION: Duration = Duration::from_secs(600);

/// Most clients tracked with their own bucket.
pub const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Minimum time between two prunes of a full table.
const PRUNE_INTERVAL: Duration = Duration::from_secs(10);

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Token refill rate. Zero or less disables limiting.
    pub requests_per_second: f64,
    /// Bucket capacity. Treated as at least one.
    pub burst: u32,
}

impl RateLimitConfig {
    /// Whether requests are limited at all.
    pub fn is_enabled(&self) -> bool {
        self.requests_per_second > 0.0
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 25.0,
            burst: 50,
        }
    }
}

/// Per-key rate limit state.
#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Refill for the time since the last call, then spend one token if available.
    fn take(&mut self, now: Instant, rate: f64, capacity: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Bucket table plus the bucket shared by clients that do not fit in it.
#[derive(Debug)]
struct Buckets {
    clients: HashMap<String, Bucket>,
    overflow: Option<Bucket>,
    last_prune: Option<Instant>,
}

/// Shared rate limiter state.
///
/// At most [`MAX_TRACKED_CLIENTS`] keys get their own bucket. While the table
/// is full, new keys draw from a single overflow bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(Buckets {
                clients: HashMap::new(),
                overflow: None,
                last_prune: None,
            })),
        }
    }

    /// Whether this limiter rejects anything at all.
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Check if a request from the given key should be allowed.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if !self.config.is_enabled() {
            return true;
        }
        let rate = self.config.requests_per_second;
        let capacity = f64::from(self.config.burst.max(1));
        let mut buckets = self.buckets.lock();
        let buckets = &mut *buckets;

        if let Some(bucket) = buckets.clients.get_mut(key) {
            return bucket.take(now, rate, capacity);
        }

        if buckets.clients.len() >= MAX_TRACKED_CLIENTS {
            let due = buckets
                .last_prune
                .map_or(true, |at| now.saturating_duration_since(at) >= PRUNE_INTERVAL);
            if due {
                buckets
                    .clients
                    .retain(|_, b| now.saturating_duration_since(b.last_refill) < IDLE_EVICTION);
                buckets.last_prune = Some(now);
            }
        }

        if buckets.clients.len() >= MAX_TRACKED_CLIENTS {
            return buckets
                .overflow
                .get_or_insert_with(|| Bucket::full(capacity, now))
                .take(now, rate, capacity);
        }

        buckets
            .clients
            .entry(key.to_string())
            .or_insert_with(|| Bucket::full(capacity, now))
            .take(now, rate, capacity)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().clients.len()
    }
}

/// Derive the rate-limit key for a request.
pub fn client_key(headers: &HeaderMap) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real_ip) = header_str("x-real-ip") {
        return real_ip.to_string();
    }
    "anonymous".to_string()
}

/// Middleware that enforces per-client rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = client_key(request.headers());
        if !limiter.check(&key) {
            tracing::warn!(client = %key, path = %request.uri().path(), "rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            return response;
        }
    }

    next.run(request).await
}
