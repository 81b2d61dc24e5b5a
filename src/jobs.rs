//! Job search API client
//!
//! Queries the backend's aggregated job search and keeps the last successful
//! result per query on disk, so a recent search still answers while offline.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::{cached_search, CacheKey, CacheManager};
use crate::net::{FetchError, FetchRequest, ResilientFetcher};

/// Telemetry context for job search calls
const CONTEXT: &str = "jobs_search";

/// A single job posting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobItem {
    pub id: String,
    /// Upstream job board the posting came from
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub canton: Option<String>,
    pub url: String,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// One page of search results
///
/// The default value is the empty result the UI shows when nothing is available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSearchResponse {
    pub items: Vec<JobItem>,
    #[serde(default)]
    pub total: Option<u64>,
    /// Result counts per upstream source
    #[serde(default)]
    pub sources: Option<BTreeMap<String, u64>>,
}

/// Parameters of a job search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub keyword: String,
    pub canton: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl JobQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            canton: None,
            page: 1,
            per_page: 20,
        }
    }

    pub fn canton(mut self, canton: impl Into<String>) -> Self {
        self.canton = Some(canton.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    fn canton_filter(&self) -> Option<&str> {
        self.canton.as_deref().filter(|c| !c.is_empty())
    }

    /// Deterministic cache key covering every parameter that changes the result
    ///
    /// Free-text fields are escaped so no two queries share a raw key.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            "jobs",
            format!(
                "jobs|q={}|canton={}|page={}|per={}",
                escape_key_field(&self.keyword),
                escape_key_field(self.canton_filter().unwrap_or("")),
                self.page,
                self.per_page
            ),
        )
    }

    /// Appends the query string to the search endpoint
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", &self.keyword)
                .append_pair("page", &self.page.to_string())
                .append_pair("per_page", &self.per_page.to_string());
            if let Some(canton) = self.canton_filter() {
                pairs.append_pair("canton", canton);
            }
        }
        url
    }
}

fn escape_key_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '|' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Client for the job search endpoint
#[derive(Debug, Clone)]
pub struct JobsClient {
    fetcher: ResilientFetcher,
    cache: Option<CacheManager>,
    endpoint: Url,
    ttl: Duration,
}

impl JobsClient {
    /// Create a client for `endpoint` (e.g. `<base>/api/v1/jobs/search`)
    pub fn new(fetcher: ResilientFetcher, cache: Option<CacheManager>, endpoint: Url, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache,
            endpoint,
            ttl,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Search jobs
    ///
    /// # Returns
    /// * `Ok(JobSearchResponse)` - fresh results, a cached result no older than
    ///   the TTL when the network fails, or an empty result when the server
    ///   answers with an error status or an undecodable body
    /// * `Err(FetchError)` - the network failed and nothing fresh is cached
    pub async fn search(&self, query: &JobQuery) -> Result<JobSearchResponse, FetchError> {
        let key = query.cache_key();
        let request = FetchRequest::get(query.to_url(&self.endpoint))
            .with_header("Accept", "application/json");

        cached_search(self.cache.as_ref(), &key, self.ttl, || async {
            let response = self
                .fetcher
                .fetch_with_retry(&request, CONTEXT)
                .await?
                .error_for_status()?;
            Ok::<_, FetchError>(response.json_or_default::<JobSearchResponse>())
        })
        .await
    }
}
