//! sweezy-net library
//!
//! Resilient HTTP fetching for the Sweezy backend: timed requests with bounded
//! retry and backoff, best-effort telemetry, and a time-boxed disk cache for
//! job search results.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod jobs;
pub mod net;
pub mod telemetry;

pub use cache::{cached_search, CacheKey, CacheManager};
pub use config::Config;
pub use context::AppContext;
pub use jobs::{JobQuery, JobSearchResponse, JobsClient};
pub use net::{FetchError, FetchRequest, FetchResponse, ResilientFetcher, RetryPolicy};
