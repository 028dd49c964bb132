//! Environment configuration for the API and worker binaries.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Sink URL used when `VM_URL` is unset.
pub const DEFAULT_VM_URL: &str = "http://victoriametrics:8428";

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key).ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be valid: {e}"))),
    }
}

/// Like `parsed`, but rejects zero.
fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + PartialEq + Default,
    T::Err: Display,
{
    let value = parsed(lookup, key, default)?;
    if value == T::default() {
        return Err(AppError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration, AppError> {
    positive(lookup, key, default).map(Duration::from_millis)
}

/// Connection settings shared by both binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub vm_url: String,
    pub sink_timeout: Duration,
}

impl BackendConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            database_url: required(lookup, "DATABASE_URL")?,
            db_max_connections: positive(lookup, "DB_MAX_CONNECTIONS", 10)?,
            vm_url: lookup("VM_URL").unwrap_or_else(|| DEFAULT_VM_URL.to_string()),
            sink_timeout: millis(lookup, "SINK_TIMEOUT_MS", 5_000)?,
        })
    }
}

/// Settings of the `swapflow-api` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub backend: BackendConfig,
    pub host: String,
    pub port: u16,
    /// Time between two stats snapshots.
    pub stats_interval: Duration,
    /// Snapshots a WebSocket subscriber may have queued before it is dropped.
    pub subscriber_buffer: usize,
}

impl ApiConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendConfig::from_lookup(&lookup)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8085)?,
            stats_interval: millis(&lookup, "STATS_INTERVAL_MS", 100)?,
            subscriber_buffer: positive(&lookup, "SUBSCRIBER_BUFFER", 2)?,
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

/// Settings of the `swapflow-worker` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub backend: BackendConfig,
    pub workers: usize,
    pub poll_interval: Duration,
    pub batch_size: usize,
    /// Backlog depth above which a warning is logged; zero disables the check.
    pub backlog_warn_threshold: u64,
    pub backlog_check_interval: Duration,
}

impl WorkerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendConfig::from_lookup(&lookup)?,
            workers: positive(&lookup, "WORKERS", 2)?,
            poll_interval: millis(&lookup, "POLL_INTERVAL_MS", 100)?,
            batch_size: positive(&lookup, "BATCH_SIZE", 1_000)?,
            backlog_warn_threshold: parsed(&lookup, "BACKLOG_WARN_THRESHOLD", 100_000)?,
            backlog_check_interval: millis(&lookup, "BACKLOG_CHECK_INTERVAL_MS", 10_000)?,
        })
    }
}
