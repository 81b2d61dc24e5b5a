//! Bounded telemetry queue drained by a background worker
//!
//! Events are pushed onto a tokio channel without waiting. A worker task
//! batches them up and hands each batch to a [`TelemetryUploader`]. On
//! shutdown the worker drains whatever is still queued before exiting, so
//! events emitted right before process exit are still delivered.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{TelemetryEvent, TelemetrySink, TelemetryUploader};

/// Configuration for telemetry delivery
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Whether events are shipped at all
    pub enabled: bool,
    /// Source tag stamped on network events
    pub source: String,
    /// Events held in the channel before new ones are dropped
    pub queue_capacity: usize,
    /// Events per upload
    pub batch_size: usize,
    /// Maximum time an event waits before its batch is flushed
    pub flush_interval: Duration,
    /// Upper bound on the final drain during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: "network".to_string(),
            queue_capacity: 256,
            batch_size: 50,
            flush_interval: Duration::from_secs(8),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Sending half of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl TelemetrySink for TelemetryQueue {
    fn emit(&self, event: TelemetryEvent) {
        if let Err(e) = self.tx.try_send(event) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            };
            tracing::debug!(reason, "telemetry event dropped");
        }
    }
}

/// Handle for stopping the background worker
pub struct TelemetryWorker {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<usize>,
    shutdown_timeout: Duration,
}

impl TelemetryWorker {
    /// Stops the worker after draining and uploading everything queued
    ///
    /// Returns the number of events delivered over the worker's lifetime, or 0
    /// if the drain did not finish within the configured timeout.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown_tx.send(()).await;
        match tokio::time::timeout(self.shutdown_timeout, self.join).await {
            Ok(Ok(delivered)) => delivered,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "telemetry worker ended abnormally");
                0
            }
            Err(_) => {
                tracing::warn!("telemetry drain timed out, pending events lost");
                0
            }
        }
    }
}

/// Creates the queue and spawns its worker on the current tokio runtime
pub fn spawn_queue<U: TelemetryUploader>(
    config: &TelemetryConfig,
    uploader: U,
) -> (TelemetryQueue, TelemetryWorker) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    let batch_size = config.batch_size.max(1);
    let join = tokio::spawn(run_worker(
        rx,
        shutdown_rx,
        uploader,
        batch_size,
        config.flush_interval,
    ));

    (
        TelemetryQueue { tx },
        TelemetryWorker {
            shutdown_tx,
            join,
            shutdown_timeout: config.shutdown_timeout,
        },
    )
}

async fn run_worker<U: TelemetryUploader>(
    mut rx: mpsc::Receiver<TelemetryEvent>,
    mut shutdown_rx: mpsc::Receiver<()>,
    uploader: U,
    batch_size: usize,
    flush_interval: Duration,
) -> usize {
    let mut buffer = Vec::with_capacity(batch_size);
    let mut delivered = 0;
    let mut ticker = tokio::time::interval(flush_interval);
    // Skip the first tick (immediate)
    ticker.tick().await;

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(event) => {
                    buffer.push(event);
                    if buffer.len() >= batch_size {
                        delivered += flush(&uploader, &mut buffer).await;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                delivered += flush(&uploader, &mut buffer).await;
            }
            _ = shutdown_rx.recv() => {
                rx.close();
                while let Some(event) = rx.recv().await {
                    buffer.push(event);
                }
                break;
            }
        }
    }

    while !buffer.is_empty() {
        let rest = buffer.split_off(batch_size.min(buffer.len()));
        delivered += flush(&uploader, &mut buffer).await;
        buffer = rest;
    }
    delivered
}

async fn flush<U: TelemetryUploader>(uploader: &U, buffer: &mut Vec<TelemetryEvent>) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    let batch = std::mem::take(buffer);
    let count = batch.len();
    match uploader.upload(batch).await {
        Ok(()) => count,
        Err(e) => {
            tracing::debug!(error = %e, dropped = count, "telemetry batch not delivered");
            0
        }
    }
}
