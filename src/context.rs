//! Process-wide dependency container
//!
//! Built once at startup and passed by reference. Construction order is
//! explicit: HTTP client, cache, telemetry, fetcher, then the API clients.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::CacheManager;
use crate::config::{Config, ConfigError};
use crate::jobs::JobsClient;
use crate::net::{ReqwestTransport, ResilientFetcher};
use crate::telemetry::{spawn_queue, HttpUploader, TelemetrySink, TelemetryWorker, TracingSink};

/// Errors that can occur while building the context
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shared services for one process
pub struct AppContext {
    config: Config,
    cache: Option<CacheManager>,
    fetcher: ResilientFetcher,
    jobs: JobsClient,
    telemetry_worker: Option<TelemetryWorker>,
}

impl AppContext {
    /// Builds every service from `config`
    ///
    /// Spawns the telemetry worker, so this must run inside a tokio runtime.
    pub fn build(config: Config) -> Result<Self, ContextError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = match &config.cache_dir {
            Some(dir) => Some(CacheManager::with_dir(dir.clone())),
            None => CacheManager::new(),
        };
        if cache.is_none() {
            tracing::info!("no cache directory available, job search runs uncached");
        }

        let (telemetry, telemetry_worker) = if config.telemetry.enabled {
            let uploader = HttpUploader::new(http.clone(), config.api_url("telemetry/batch")?);
            let (queue, worker) = spawn_queue(&config.telemetry, uploader);
            let sink: Arc<dyn TelemetrySink> = Arc::new(queue);
            (sink, Some(worker))
        } else {
            let sink: Arc<dyn TelemetrySink> = Arc::new(TracingSink);
            (sink, None)
        };

        let fetcher = ResilientFetcher::new(Arc::new(ReqwestTransport::with_client(http)), telemetry)
            .with_policy(config.retry.clone())
            .with_slow_threshold(config.slow_threshold)
            .with_source(config.telemetry.source.clone());

        let jobs = JobsClient::new(
            fetcher.clone(),
            cache.clone(),
            config.api_url("jobs/search")?,
            config.jobs_cache_ttl,
        );

        Ok(Self {
            config,
            cache,
            fetcher,
            jobs,
            telemetry_worker,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    pub fn jobs(&self) -> &JobsClient {
        &self.jobs
    }

    /// Drains pending telemetry. Call once before the process exits.
    pub async fn shutdown(self) {
        if let Some(worker) = self.telemetry_worker {
            let delivered = worker.shutdown().await;
            tracing::debug!(delivered, "telemetry worker stopped");
        }
    }
}
