//! Best-effort telemetry
//!
//! Events are fire-and-forget from the caller's point of view: emitting never
//! blocks and never fails. Delivery happens on a background worker that is
//! drained during an orderly shutdown.

mod event;
mod queue;
mod sink;
mod upload;

pub use event::{Level, TelemetryEvent, KIND_FAILURE, KIND_SLOW};
pub use queue::{spawn_queue, TelemetryConfig, TelemetryQueue, TelemetryWorker};
pub use sink::{MemorySink, TelemetrySink, TracingSink};
pub use upload::{HttpUploader, TelemetryUploader};

use thiserror::Error;

/// Errors that can occur when delivering telemetry
///
/// These never reach callers of the fetch helpers; the worker logs and drops them.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// HTTP request failed
    #[error("telemetry request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The ingestion endpoint rejected the batch
    #[error("telemetry endpoint returned status {0}")]
    Status(u16),
}
