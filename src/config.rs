//! Runtime configuration
//!
//! Defaults reproduce the reference behaviour of the mobile client; the CLI can
//! override the base URL, cache location, timeout and telemetry.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cli::Cli;
use crate::net::{RetryPolicy, DEFAULT_SLOW_THRESHOLD};
use crate::telemetry::TelemetryConfig;

/// Production backend
pub const DEFAULT_BASE_URL: &str = "https://sweezy-9xyk.onrender.com";

const API_PREFIX: &str = "api/v1";

/// Errors that can occur while building configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL or a path joined onto it did not parse
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry a path (e.g. `mailto:`)
    #[error("base URL cannot be used for API requests: {0}")]
    UnsupportedBase(String),
}

/// Settings shared by every component built from the context
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend root, without the `api/v1` prefix
    pub base_url: Url,
    /// Overall timeout per network attempt
    pub request_timeout: Duration,
    /// Cache location override; `None` uses the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Retry budget and backoff
    pub retry: RetryPolicy,
    /// Successful calls slower than this are reported
    pub slow_threshold: Duration,
    /// Maximum age of a cached job search served after a failed fetch
    pub jobs_cache_ttl: Duration,
    /// Telemetry delivery
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            request_timeout: Duration::from_secs(15),
            cache_dir: None,
            retry: RetryPolicy::default(),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            jobs_cache_ttl: Duration::from_secs(3600),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Creates a Config from parsed CLI arguments, keeping defaults for anything unset
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(base) = &cli.base_url {
            config.base_url = Url::parse(base)?;
        }
        if config.base_url.cannot_be_a_base() {
            return Err(ConfigError::UnsupportedBase(config.base_url.to_string()));
        }
        if let Some(secs) = cli.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.cache_dir = cli.cache_dir.clone();
        config.telemetry.enabled = !cli.no_telemetry;
        if cli.no_retry {
            config.retry = RetryPolicy::none();
        }
        Ok(config)
    }

    /// Resolves an API path against the base URL
    ///
    /// A leading `/` is ignored and `api/v1/` is prepended unless the path
    /// already starts with `api/`.
    pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let full = if path.starts_with("api/") {
            path.to_string()
        } else {
            format!("{API_PREFIX}/{path}")
        };

        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(&full)?)
    }
}
