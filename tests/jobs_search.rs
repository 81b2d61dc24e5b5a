//! Job search against a local mock backend, including the offline cache fallback

mod common;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use common::{fail, ok, status, ScriptedTransport};
use httpmock::Method::GET;
use httpmock::MockServer;
use sweezy_net::net::{FetchError, ReqwestTransport, ResilientFetcher, TransportErrorKind};
use sweezy_net::telemetry::{MemorySink, KIND_FAILURE};
use sweezy_net::{CacheManager, JobQuery, JobSearchResponse, JobsClient};
use tempfile::TempDir;
use url::Url;

const TTL: Duration = Duration::from_secs(3600);

const BODY: &str = r#"{
  "items": [
    {"id": "42", "source": "jobs.ch", "title": "Line Cook", "company": "Hotel Bellevue",
     "canton": "ZH", "url": "https://jobs.ch/42", "posted_at": "2024-05-01"}
  ],
  "total": 1,
  "sources": {"jobs.ch": 1}
}"#;

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/v1/jobs/search", server.base_url())).unwrap()
}

fn http_client(server: &MockServer, cache: &CacheManager, sink: &MemorySink) -> JobsClient {
    let fetcher = ResilientFetcher::new(Arc::new(ReqwestTransport::default()), Arc::new(sink.clone()));
    JobsClient::new(fetcher, Some(cache.clone()), endpoint(server), TTL)
}

fn scripted_client(transport: Arc<ScriptedTransport>, cache: &CacheManager) -> JobsClient {
    let fetcher = ResilientFetcher::new(transport, Arc::new(MemorySink::new()));
    let endpoint = Url::parse("https://example.test/api/v1/jobs/search").unwrap();
    JobsClient::new(fetcher, Some(cache.clone()), endpoint, TTL)
}

fn temp_cache() -> (CacheManager, TempDir) {
    let dir = TempDir::new().unwrap();
    (CacheManager::with_dir(dir.path().to_path_buf()), dir)
}

#[tokio::test]
async fn test_search_sends_query_and_caches_result() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/jobs/search")
            .query_param("q", "cook")
            .query_param("canton", "ZH")
            .query_param("page", "1")
            .query_param("per_page", "20");
        then.status(200)
            .header("content-type", "application/json")
            .body(BODY);
    });
    let (cache, _dir) = temp_cache();
    let sink = MemorySink::new();
    let client = http_client(&server, &cache, &sink);
    let query = JobQuery::new("cook").canton("ZH");

    let result = client.search(&query).await.unwrap();

    mock.assert();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].title, "Line Cook");
    assert_eq!(result.total, Some(1));
    assert_eq!(
        cache.read_fresh::<JobSearchResponse>(&query.cache_key(), TTL),
        Some(result)
    );
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_error_status_without_cache_yields_empty_result() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/jobs/search");
        then.status(500).body("upstream exploded");
    });
    let (cache, _dir) = temp_cache();
    let sink = MemorySink::new();
    let client = http_client(&server, &cache, &sink);

    let result = client.search(&JobQuery::new("cook")).await.unwrap();

    assert_eq!(result, JobSearchResponse::default());
    assert!(sink.events().is_empty(), "HTTP errors are not network failures");
}

#[tokio::test]
async fn test_error_status_serves_cached_result() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/jobs/search");
        then.status(502);
    });
    let (cache, _dir) = temp_cache();
    let query = JobQuery::new("cook");
    let cached: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&query.cache_key(), &cached).unwrap();
    let client = http_client(&server, &cache, &MemorySink::new());

    let result = client.search(&query).await.unwrap();

    assert_eq!(result, cached);
}

#[tokio::test]
async fn test_undecodable_body_is_treated_as_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/jobs/search");
        then.status(200).body("<html>maintenance</html>");
    });
    let (cache, _dir) = temp_cache();
    let client = http_client(&server, &cache, &MemorySink::new());

    let result = client.search(&JobQuery::new("cook")).await.unwrap();

    assert!(result.items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_offline_search_serves_fresh_cache() {
    let (cache, _dir) = temp_cache();
    let query = JobQuery::new("cook").page(2);
    let cached: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&query.cache_key(), &cached).unwrap();

    let transport = Arc::new(ScriptedTransport::new(vec![
        fail(TransportErrorKind::Offline),
        fail(TransportErrorKind::Offline),
    ]));
    let client = scripted_client(transport.clone(), &cache);

    let result = client.search(&query).await.unwrap();

    assert_eq!(result, cached);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_offline_search_without_cache_propagates_error() {
    let (cache, _dir) = temp_cache();
    let transport = Arc::new(ScriptedTransport::new(vec![
        fail(TransportErrorKind::Timeout),
        fail(TransportErrorKind::Timeout),
    ]));
    let sink = MemorySink::new();
    let fetcher = ResilientFetcher::new(transport, Arc::new(sink.clone()));
    let endpoint = Url::parse("https://example.test/api/v1/jobs/search").unwrap();
    let client = JobsClient::new(fetcher, Some(cache), endpoint, TTL);

    let err = client.search(&JobQuery::new("cook")).await.unwrap_err();

    assert!(matches!(err, FetchError::Network { attempts: 2, .. }));
    assert_eq!(sink.count_kind(KIND_FAILURE), 1);
}

#[tokio::test(start_paused = true)]
async fn test_different_pages_do_not_share_cache_entries() {
    let (cache, _dir) = temp_cache();
    let page_one = JobQuery::new("cook");
    let cached: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&page_one.cache_key(), &cached).unwrap();

    let transport = Arc::new(ScriptedTransport::new(vec![
        fail(TransportErrorKind::Dns),
        fail(TransportErrorKind::Dns),
    ]));
    let client = scripted_client(transport, &cache);

    let err = client.search(&page_one.clone().page(2)).await;

    assert!(err.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_successful_search_replaces_cache_entry() {
    let (cache, _dir) = temp_cache();
    let query = JobQuery::new("cook");
    let old: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&query.cache_key(), &old).unwrap();

    let transport = Arc::new(ScriptedTransport::new(vec![ok(r#"{"items":[],"total":0}"#)]));
    let client = scripted_client(transport, &cache);

    let result = client.search(&query).await.unwrap();

    assert!(result.items.is_empty());
    assert_eq!(
        cache.read_fresh::<JobSearchResponse>(&query.cache_key(), TTL),
        Some(result)
    );
}

#[tokio::test(start_paused = true)]
async fn test_scripted_error_status_is_soft() {
    let (cache, _dir) = temp_cache();
    let transport = Arc::new(ScriptedTransport::new(vec![status(404)]));
    let client = scripted_client(transport, &cache);

    let result = client.search(&JobQuery::new("cook")).await.unwrap();

    assert_eq!(result, JobSearchResponse::default());
}

/// Written at T0 with a one-hour TTL: a read at T0+3599s is served, while at
/// T0+3601s the failed fetch's error comes through.
#[test]
fn test_cache_ttl_boundary_around_one_hour() {
    let (cache, _dir) = temp_cache();
    let query = JobQuery::new("cook");
    let key = query.cache_key();
    let cached: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&key, &cached).unwrap();

    let written = std::fs::metadata(cache.cache_path(&key))
        .unwrap()
        .modified()
        .unwrap();
    let at = |secs: u64| -> SystemTime { written + Duration::from_secs(secs) };

    assert_eq!(
        cache.read_fresh_at::<JobSearchResponse>(&key, TTL, at(3599)),
        Some(cached)
    );
    assert_eq!(
        cache.read_fresh_at::<JobSearchResponse>(&key, TTL, at(3601)),
        None
    );
}

/// Same boundary through `cached_search`, using a TTL short enough to cross in real time.
#[tokio::test]
async fn test_expired_cache_lets_fetch_error_through() {
    let (cache, _dir) = temp_cache();
    let key = JobQuery::new("cook").cache_key();
    let cached: JobSearchResponse = serde_json::from_str(BODY).unwrap();
    cache.write(&key, &cached).unwrap();

    let network_error = || FetchError::Network {
        source: sweezy_net::net::TransportError::new(TransportErrorKind::Timeout, "simulated"),
        attempts: 2,
    };

    let fresh = sweezy_net::cached_search(Some(&cache), &key, Duration::from_secs(3), || async {
        Err::<JobSearchResponse, _>(network_error())
    })
    .await;
    assert_eq!(fresh.unwrap(), cached);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let expired = sweezy_net::cached_search(Some(&cache), &key, Duration::ZERO, || async {
        Err::<JobSearchResponse, _>(network_error())
    })
    .await;
    assert!(matches!(expired, Err(FetchError::Network { .. })));
}
