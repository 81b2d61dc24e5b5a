//! Timed fetch with bounded retry and telemetry

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use url::Url;

use super::{FetchError, FetchRequest, FetchResponse, RetryPolicy, Transport};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Calls slower than this emit a `slow` telemetry event
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(2000);

/// Executes requests with latency measurement, retry on transient failures,
/// and side-channel telemetry
///
/// Per call the fetcher emits at most one telemetry event: `slow` when the
/// successful attempt exceeded the slow threshold, or `failure` when the call
/// failed terminally. Cloning is cheap; clones share the transport and sink.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    telemetry: Arc<dyn TelemetrySink>,
    policy: RetryPolicy,
    slow_threshold: Duration,
    source: String,
}

impl ResilientFetcher {
    /// Create a fetcher with the default retry policy and slow threshold
    pub fn new(transport: Arc<dyn Transport>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            transport,
            telemetry,
            policy: RetryPolicy::default(),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            source: "network".to_string(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Source tag stamped on emitted telemetry events
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs `request`, retrying transient failures within the retry budget
    ///
    /// `context` is a free-form label attached to telemetry only. Any HTTP
    /// status counts as success here; the response is returned unchanged.
    pub async fn fetch_with_retry(
        &self,
        request: &FetchRequest,
        context: &str,
    ) -> Result<FetchResponse, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            match self.transport.send(request).await {
                Ok(mut response) => {
                    let elapsed = start.elapsed();
                    response.elapsed = elapsed;
                    response.attempts = attempt + 1;
                    if elapsed > self.slow_threshold {
                        tracing::warn!(
                            ctx = context,
                            ms = elapsed.as_millis() as u64,
                            url = %request.url(),
                            "slow request"
                        );
                        self.telemetry
                            .emit(TelemetryEvent::slow(&self.source, context, elapsed));
                    }
                    return Ok(response);
                }
                Err(err) if err.is_transient() && attempt + 1 < self.policy.max_attempts() => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(
                        ctx = context,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        ctx = context,
                        attempts = attempt + 1,
                        url = %request.url(),
                        error = %err,
                        "request failed"
                    );
                    self.telemetry
                        .emit(TelemetryEvent::failure(&self.source, context, &err));
                    return Err(FetchError::Network {
                        source: err,
                        attempts: attempt + 1,
                    });
                }
            }
        }
    }

    /// GET `url` through [`ResilientFetcher::fetch_with_retry`]
    pub async fn get(&self, url: Url, context: &str) -> Result<FetchResponse, FetchError> {
        self.fetch_with_retry(&FetchRequest::get(url), context).await
    }
}

impl std::fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("policy", &self.policy)
            .field("slow_threshold", &self.slow_threshold)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
