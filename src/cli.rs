//! Command-line interface parsing for sweezy-net
//!
//! This module handles parsing of CLI arguments using clap, plus the helpers
//! that turn raw `--header`/`--method` strings into request parts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Method;
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--header` value is not of the form `Name: value`
    #[error("Invalid header: '{0}'. Expected 'Name: value'")]
    InvalidHeader(String),

    /// The `--method` value is not a valid HTTP method token
    #[error("Invalid method: '{0}'")]
    InvalidMethod(String),
}

/// sweezy-net - resilient access to the Sweezy backend
#[derive(Parser, Debug)]
#[command(name = "sweezy-net")]
#[command(about = "Fetch from the Sweezy backend with retry, telemetry and cached job search")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "SWEEZY_API_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory for cached responses (defaults to the platform cache directory)
    #[arg(long, global = true, env = "SWEEZY_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Per-attempt request timeout in seconds
    #[arg(long, global = true, env = "SWEEZY_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Make a single attempt per request instead of retrying transient failures
    #[arg(long, global = true, env = "SWEEZY_NO_RETRY")]
    pub no_retry: bool,

    /// Log telemetry locally instead of sending it
    #[arg(long, global = true, env = "SWEEZY_NO_TELEMETRY")]
    pub no_telemetry: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Perform a single request with retry and print the response
    ///
    /// Examples:
    ///   sweezy-net fetch https://sweezy-9xyk.onrender.com/api/v1/guides
    ///   sweezy-net fetch -X POST -H 'Content-Type: application/json' -d '{}' URL
    Fetch {
        /// Absolute URL to request
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long, value_name = "BODY")]
        data: Option<String>,

        /// Label attached to telemetry for this call
        #[arg(long, default_value = "cli")]
        context: String,
    },

    /// Search jobs, falling back to a cached result when offline
    Jobs {
        /// Search keyword
        keyword: String,

        /// Canton filter (e.g. ZH, GE)
        #[arg(long)]
        canton: Option<String>,

        /// Result page, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Results per page
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },

    /// Delete all cached responses
    ClearCache,
}

/// Parses a `Name: value` header argument.
///
/// # Returns
/// * `Ok((name, value))` with surrounding whitespace trimmed
/// * `Err(CliError::InvalidHeader)` if there is no colon or the name is empty
pub fn parse_header_arg(s: &str) -> Result<(String, String), CliError> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| CliError::InvalidHeader(s.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidHeader(s.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parses an HTTP method argument, case-insensitively.
pub fn parse_method_arg(s: &str) -> Result<Method, CliError> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(s.to_string()))
}
