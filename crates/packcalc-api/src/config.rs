//! # Server Configuration
//!
//! Resolves a [`ServerConfig`] from four layers, later layers winning:
//!
//! 1. Built-in defaults.
//! 2. An optional YAML file (`--config <path>`).
//! 3. Environment variables (`PORT`, `PACK_SIZES`, `RATE_LIMIT_RPS`,
//!    `RATE_LIMIT_BURST`, `MAX_ITEMS`, `METRICS_ENABLED`, `LOG_FORMAT`).
//! 4. Command-line flags.
//!
//! Blank environment values count as unset. Keys absent from the YAML file
//! leave the lower layer untouched.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use packcalc_core::{PackSizeSet, PackingError, DEFAULT_PACK_SIZES};
use serde::Deserialize;
use thiserror::Error;

/// Default upper bound on `items` accepted by `POST /api/calculate`.
pub const DEFAULT_MAX_ITEMS: i64 = 10_000_000;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("invalid initial pack sizes: {0}")]
    PackSizes(#[from] PackingError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-field lines.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format {other:?}, expected json or pretty")),
        }
    }
}

/// Command-line flags. Every flag overrides the file and environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "packcalc-api", version, about = "Order pack calculator HTTP service")]
pub struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen port, or a full `host:port` address.
    #[arg(long)]
    pub port: Option<String>,

    /// Initial pack sizes as a comma-separated list, e.g. `250,500,1000`.
    #[arg(long, value_name = "SIZES")]
    pub pack_sizes: Option<String>,

    /// Sustained requests per second per client. Zero disables rate limiting.
    #[arg(long)]
    pub rate_limit_rps: Option<f64>,

    /// Burst capacity per client.
    #[arg(long)]
    pub rate_limit_burst: Option<u32>,

    /// Largest item count accepted by the calculate endpoint.
    #[arg(long)]
    pub max_items: Option<i64>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Port or `host:port`; see [`ServerConfig::bind_addr`].
    pub port: String,
    /// Pack sizes the store starts with.
    pub initial_pack_sizes: Vec<i64>,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_period: Duration,
    /// Per-request deadline; exceeded requests get 408.
    pub request_timeout: Duration,
    /// Whether to emit a tracing span per request.
    pub enable_request_logging: bool,
    /// Token refill rate per client. `0` disables rate limiting.
    pub rate_limit_rps: f64,
    /// Token bucket capacity per client.
    pub rate_limit_burst: u32,
    /// Upper bound on `items` for `POST /api/calculate`.
    pub max_items: i64,
    /// Whether `/metrics` is served and request metrics are recorded.
    pub metrics_enabled: bool,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            initial_pack_sizes: DEFAULT_PACK_SIZES.to_vec(),
            shutdown_grace_period: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            enable_request_logging: true,
            rate_limit_rps: 25.0,
            rate_limit_burst: 50,
            max_items: DEFAULT_MAX_ITEMS,
            metrics_enabled: true,
            log_format: LogFormat::Json,
        }
    }
}

/// On-disk YAML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    port: Option<PortValue>,
    pack_sizes: Option<Vec<i64>>,
    shutdown_grace_period: Option<String>,
    request_timeout: Option<String>,
    enable_request_logging: Option<bool>,
    rate_limit: Option<RateLimitSection>,
    max_items: Option<i64>,
    metrics_enabled: Option<bool>,
    log_format: Option<LogFormat>,
}

/// `port: 8080` and `port: "0.0.0.0:8080"` are both accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RateLimitSection {
    rps: Option<f64>,
    burst: Option<u32>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ServerConfig {
    /// Resolve configuration from `cli`, the process environment and the
    /// file named by `--config`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Like [`ServerConfig::load`] with an injected environment lookup.
    pub fn load_with_env<F>(cli: &Cli, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = &cli.config {
            config.apply_file(ConfigFile::read(path)?)?;
        }
        config.apply_env(&env)?;
        config.apply_cli(cli)?;
        config.validate()?;
        Ok(config)
    }

    /// Socket address to bind. A bare port binds every interface; a value
    /// starting with `:` gets `0.0.0.0` prepended.
    pub fn bind_addr(&self) -> String {
        let port = self.port.trim();
        if port.starts_with(':') {
            format!("0.0.0.0{port}")
        } else if port.contains(':') {
            port.to_string()
        } else {
            format!("0.0.0.0:{port}")
        }
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(port) = file.port {
            self.port = match port {
                PortValue::Number(n) => n.to_string(),
                PortValue::Text(s) => s,
            };
        }
        if let Some(sizes) = file.pack_sizes {
            self.initial_pack_sizes = sizes;
        }
        if let Some(raw) = file.shutdown_grace_period {
            self.shutdown_grace_period = parse_duration("shutdown_grace_period", &raw)?;
        }
        if let Some(raw) = file.request_timeout {
            self.request_timeout = parse_duration("request_timeout", &raw)?;
        }
        if let Some(enabled) = file.enable_request_logging {
            self.enable_request_logging = enabled;
        }
        if let Some(section) = file.rate_limit {
            if let Some(rps) = section.rps {
                self.rate_limit_rps = rps;
            }
            if let Some(burst) = section.burst {
                self.rate_limit_burst = burst;
            }
        }
        if let Some(max) = file.max_items {
            self.max_items = max;
        }
        if let Some(enabled) = file.metrics_enabled {
            self.metrics_enabled = enabled;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = lookup("PORT") {
            self.port = port;
        }
        if let Some(raw) = lookup("PACK_SIZES") {
            self.initial_pack_sizes = parse_pack_sizes(&raw).map_err(|reason| {
                ConfigError::InvalidValue {
                    key: "PACK_SIZES",
                    reason,
                }
            })?;
        }
        if let Some(raw) = lookup("RATE_LIMIT_RPS") {
            self.rate_limit_rps = parse_value("RATE_LIMIT_RPS", &raw)?;
        }
        if let Some(raw) = lookup("RATE_LIMIT_BURST") {
            self.rate_limit_burst = parse_value("RATE_LIMIT_BURST", &raw)?;
        }
        if let Some(raw) = lookup("MAX_ITEMS") {
            self.max_items = parse_value("MAX_ITEMS", &raw)?;
        }
        if let Some(raw) = lookup("METRICS_ENABLED") {
            self.metrics_enabled = parse_bool("METRICS_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("LOG_FORMAT") {
            self.log_format = raw
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    reason,
                })?;
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(port) = &cli.port {
            self.port = port.clone();
        }
        if let Some(raw) = &cli.pack_sizes {
            self.initial_pack_sizes =
                parse_pack_sizes(raw).map_err(|reason| ConfigError::InvalidValue {
                    key: "--pack-sizes",
                    reason,
                })?;
        }
        if let Some(rps) = cli.rate_limit_rps {
            self.rate_limit_rps = rps;
        }
        if let Some(burst) = cli.rate_limit_burst {
            self.rate_limit_burst = burst;
        }
        if let Some(max) = cli.max_items {
            self.max_items = max;
        }
        if let Some(format) = cli.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "port",
                reason: "must not be empty".to_string(),
            });
        }
        PackSizeSet::new(&self.initial_pack_sizes)?;
        if !self.rate_limit_rps.is_finite() || self.rate_limit_rps < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "rate_limit.rps",
                reason: format!("must be a non-negative number, got {}", self.rate_limit_rps),
            });
        }
        if self.max_items <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_items",
                reason: format!("must be positive, got {}", self.max_items),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a comma-separated pack-size list such as `"250, 500,1000"`.
///
/// Blank entries are skipped. Range and cardinality checks are left to
/// [`PackSizeSet::new`].
pub fn parse_pack_sizes(raw: &str) -> Result<Vec<i64>, String> {
    let sizes = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| format!("{part:?} is not an integer"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        return Err("no pack sizes given".to_string());
    }
    Ok(sizes)
}

fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            reason: format!("{other:?} is not a boolean"),
        }),
    }
}
