//! # Application State
//!
//! Shared state handed to every handler: the pack-size store, the packing
//! engine, the resolved configuration and the metrics registry. Cloning is
//! cheap; all clones share the same store and metrics.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use packcalc_core::{DpCalculator, MemoryPackSizeStore, PackCalculator, PackSizeStore, PackingError};
use parking_lot::RwLock;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimitConfig;

/// Errors raised while building [`AppState`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid initial pack sizes: {0}")]
    PackSizes(#[from] PackingError),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<dyn PackSizeStore>,
    pub calculator: Arc<dyn PackCalculator>,
    pub metrics: ApiMetrics,
    updated_at: Arc<RwLock<DateTime<Utc>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("pack_sizes", &self.store.read())
            .field("updated_at", &self.pack_sizes_updated_at())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl AppState {
    /// State with default configuration, the default pack sizes and the
    /// dynamic-programming calculator.
    pub fn new() -> Result<Self, StateError> {
        Self::from_config(ServerConfig::default())
    }

    /// State seeded from `config.initial_pack_sizes`.
    pub fn from_config(config: ServerConfig) -> Result<Self, StateError> {
        let store = MemoryPackSizeStore::with_sizes(&config.initial_pack_sizes)?;
        Self::with_parts(config, Arc::new(store), Arc::new(DpCalculator::new()))
    }

    /// State over caller-supplied store and calculator implementations.
    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn PackSizeStore>,
        calculator: Arc<dyn PackCalculator>,
    ) -> Result<Self, StateError> {
        let metrics = ApiMetrics::new()?;
        metrics.set_pack_sizes_configured(store.read().len());
        Ok(Self {
            config: Arc::new(config),
            store,
            calculator,
            metrics,
            updated_at: Arc::new(RwLock::new(Utc::now())),
        })
    }

    /// When the pack sizes were last replaced, or the state was built.
    pub fn pack_sizes_updated_at(&self) -> DateTime<Utc> {
        *self.updated_at.read()
    }

    /// Stamp a successful pack-size replacement and return the stamp.
    pub fn mark_pack_sizes_updated(&self) -> DateTime<Utc> {
        let now = Utc::now();
        *self.updated_at.write() = now;
        now
    }

    /// Rate limiter settings derived from the configuration.
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: self.config.rate_limit_rps,
            burst: self.config.rate_limit_burst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packcalc_core::DEFAULT_PACK_SIZES;

    #[test]
    fn new_uses_default_pack_sizes() {
        let state = AppState::new().unwrap();
        assert_eq!(state.store.read().as_slice(), &DEFAULT_PACK_SIZES);
        assert_eq!(state.config.max_items, ServerConfig::default().max_items);
    }

    #[test]
    fn from_config_seeds_store() {
        let config = ServerConfig {
            initial_pack_sizes: vec![53, 23, 31],
            ..ServerConfig::default()
        };
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.store.read().as_slice(), &[23, 31, 53]);
    }

    #[test]
    fn from_config_rejects_invalid_sizes() {
        let config = ServerConfig {
            initial_pack_sizes: vec![],
            ..ServerConfig::default()
        };
        assert!(matches!(
            AppState::from_config(config),
            Err(StateError::PackSizes(_))
        ));
    }

    #[test]
    fn clones_share_store_and_timestamp() {
        let state = AppState::new().unwrap();
        let other = state.clone();
        other.store.replace(&[7]).unwrap();
        let stamp = other.mark_pack_sizes_updated();
        assert_eq!(state.store.read().as_slice(), &[7]);
        assert_eq!(state.pack_sizes_updated_at(), stamp);
    }

    #[test]
    fn mark_updated_moves_forward() {
        let state = AppState::new().unwrap();
        let before = state.pack_sizes_updated_at();
        let after = state.mark_pack_sizes_updated();
        assert!(after >= before);
    }

    #[test]
    fn rate_limit_config_follows_server_config() {
        let config = ServerConfig {
            rate_limit_rps: 2.5,
            rate_limit_burst: 4,
            ..ServerConfig::default()
        };
        let limits = AppState::from_config(config).unwrap().rate_limit_config();
        assert_eq!(limits.requests_per_second, 2.5);
        assert_eq!(limits.burst, 4);
    }

    #[test]
    fn debug_lists_pack_sizes() {
        let state = AppState::new().unwrap();
        let rendered = format!("{state:?}");
        assert!(rendered.contains("pack_sizes"));
        assert!(rendered.contains("250"));
    }
}
