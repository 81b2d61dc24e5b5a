//! Destinations for telemetry events

use std::sync::{Arc, Mutex};

use super::{Level, TelemetryEvent};

/// Accepts telemetry events without blocking or failing the caller
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Collects events in memory
///
/// Useful for tests and dry runs. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of events with the given type
    pub fn count_kind(&self, kind: &str) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, event: TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Writes events to the local log instead of shipping them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: TelemetryEvent) {
        let meta = format!("{:?}", event.meta);
        let message = event.message.as_deref().unwrap_or("");
        match event.level {
            Level::Info => tracing::info!(source = %event.source, kind = %event.kind, %meta, "{message}"),
            Level::Warn => tracing::warn!(source = %event.source, kind = %event.kind, %meta, "{message}"),
            Level::Error => tracing::error!(source = %event.source, kind = %event.kind, %meta, "{message}"),
        }
    }
}
