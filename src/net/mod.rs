//! Resilient HTTP fetching
//!
//! This module provides the request/response types, the transport seam over
//! `reqwest`, the retry policy and the [`ResilientFetcher`] that ties them
//! together with timing instrumentation and telemetry.

mod error;
mod fetch;
mod request;
mod retry;
mod transport;

pub use error::{FetchError, TransportError, TransportErrorKind};
pub use fetch::{ResilientFetcher, DEFAULT_SLOW_THRESHOLD};
pub use request::{FetchRequest, FetchResponse};
pub use retry::RetryPolicy;
pub use transport::{ReqwestTransport, Transport};
