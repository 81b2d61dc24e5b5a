//! Error taxonomy for outbound requests

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

/// Classification of a failed network attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or connection timed out
    Timeout,
    /// Host name resolution failed
    Dns,
    /// The host refused or could not be reached
    Unreachable,
    /// An established connection dropped mid-exchange
    ConnectionLost,
    /// No network route is available
    Offline,
    /// TLS handshake or certificate failure
    Tls,
    /// The request could not be built (bad header, bad method, ...)
    InvalidRequest,
    /// Anything else at the network layer
    Other,
}

impl TransportErrorKind {
    /// Whether an immediate retry is likely to succeed
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Dns | Self::Unreachable | Self::ConnectionLost | Self::Offline
        )
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timed out",
            Self::Dns => "dns lookup failed",
            Self::Unreachable => "host unreachable",
            Self::ConnectionLost => "connection lost",
            Self::Offline => "not connected",
            Self::Tls => "tls failure",
            Self::InvalidRequest => "invalid request",
            Self::Other => "network error",
        };
        f.write_str(s)
    }
}

/// A single failed network attempt
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Classifies a reqwest error by inspecting its flags and source chain
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        Self::new(classify(err), error_chain(err))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_reqwest(&err)
    }
}

/// Errors surfaced by [`super::ResilientFetcher`] and the clients built on it
#[derive(Debug, Error)]
pub enum FetchError {
    /// The network call failed and the retry budget is spent
    #[error("request failed after {attempts} attempt(s): {source}")]
    Network {
        #[source]
        source: TransportError,
        attempts: u32,
    },

    /// The server answered with a non-2xx status
    #[error("unexpected response status {status} at {url}")]
    Status { status: u16, url: String },
}

impl FetchError {
    /// Application-level failures that callers may degrade to an empty result
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Number of network attempts behind this error, if it came from the network
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Network { attempts, .. } => Some(*attempts),
            Self::Status { .. } => None,
        }
    }
}

fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_builder() {
        return TransportErrorKind::InvalidRequest;
    }
    if err.is_timeout() {
        return TransportErrorKind::Timeout;
    }

    let chain = source_chain(err).to_ascii_lowercase();
    if chain.contains("dns error") || chain.contains("failed to lookup address") {
        return TransportErrorKind::Dns;
    }
    if chain.contains("network is unreachable") {
        return TransportErrorKind::Offline;
    }

    match io_kind(err) {
        Some(io::ErrorKind::TimedOut) => return TransportErrorKind::Timeout,
        Some(io::ErrorKind::ConnectionRefused) => return TransportErrorKind::Unreachable,
        Some(
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof,
        ) => return TransportErrorKind::ConnectionLost,
        _ => {}
    }

    if chain.contains("connection closed") || chain.contains("incomplete message") {
        return TransportErrorKind::ConnectionLost;
    }
    if chain.contains("certificate") || chain.contains("tls") || chain.contains("handshake") {
        return TransportErrorKind::Tls;
    }
    if err.is_connect() {
        return TransportErrorKind::Unreachable;
    }
    TransportErrorKind::Other
}

fn io_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        current = e.source();
    }
    None
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        out.push_str(": ");
        out.push_str(&e.to_string());
        current = e.source();
    }
    out
}

/// Messages of the underlying causes only; reqwest's own message embeds the
/// request URL, which must not influence classification.
fn source_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = String::new();
    let mut current = err.source();
    while let Some(e) = current {
        if !out.is_empty() {
            out.push_str(": ");
        }
        out.push_str(&e.to_string());
        current = e.source();
    }
    out
}
