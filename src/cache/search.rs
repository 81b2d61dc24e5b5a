//! Network-first search with a time-boxed cache fallback

use std::future::Future;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::{CacheKey, CacheManager};
use crate::net::FetchError;

/// Runs `fetcher`, caching successes and falling back to a fresh cache entry on failure
///
/// - On success the result overwrites the entry for `key` and is returned.
/// - On failure an entry no older than `ttl` is returned instead of the error.
/// - Without such an entry, application-level failures (non-2xx) degrade to
///   `T::default()` and network failures are propagated unchanged.
///
/// Cache I/O problems are logged and swallowed so they never mask the network
/// error. With `cache` set to `None` this is a plain fetch with the same
/// soft-failure handling.
pub async fn cached_search<T, F, Fut>(
    cache: Option<&CacheManager>,
    key: &CacheKey,
    ttl: Duration,
    fetcher: F,
) -> Result<T, FetchError>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    match fetcher().await {
        Ok(value) => {
            if let Some(cache) = cache {
                if let Err(e) = cache.write(key, &value) {
                    tracing::debug!(key = %key, error = %e, "cache write failed");
                }
            }
            Ok(value)
        }
        Err(err) => {
            if let Some(cached) = cache.and_then(|c| c.read_fresh::<T>(key, ttl)) {
                tracing::debug!(key = %key, error = %err, "serving cached result after fetch failure");
                return Ok(cached);
            }
            if err.is_soft() {
                tracing::debug!(key = %key, error = %err, "no cached result, returning empty");
                Ok(T::default())
            } else {
                Err(err)
            }
        }
    }
}
