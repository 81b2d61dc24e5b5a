//! Delivery of telemetry batches to the ingestion endpoint

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use super::{TelemetryError, TelemetryEvent};

/// Delivers a batch of events somewhere durable
pub trait TelemetryUploader: Send + Sync + 'static {
    fn upload(&self, batch: Vec<TelemetryEvent>) -> BoxFuture<'_, Result<(), TelemetryError>>;
}

#[derive(Serialize)]
struct BatchBody<'a> {
    events: &'a [TelemetryEvent],
}

/// Posts batches as `{"events": [...]}` to the telemetry batch endpoint
///
/// Uses the plain HTTP client rather than the resilient fetcher, so delivery
/// problems never produce telemetry of their own.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: Url,
}

impl HttpUploader {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, batch: Vec<TelemetryEvent>) -> Result<(), TelemetryError> {
        if batch.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&BatchBody { events: &batch })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        tracing::debug!(count = batch.len(), "telemetry batch delivered");
        Ok(())
    }
}

impl TelemetryUploader for HttpUploader {
    fn upload(&self, batch: Vec<TelemetryEvent>) -> BoxFuture<'_, Result<(), TelemetryError>> {
        Box::pin(self.post(batch))
    }
}
