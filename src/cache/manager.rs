//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that stores serializable data as JSON files whose
//! modification time records when they were written. Freshness is decided at
//! read time against a caller-supplied TTL.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

use super::CacheKey;

/// Result of reading from cache, including when the entry was written
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was cached (file modification time)
    pub cached_at: DateTime<Utc>,
    modified: SystemTime,
}

impl<T> CachedData<T> {
    /// Age of the entry relative to `now`; an mtime in the future counts as zero
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is still within `ttl` at `now`
    pub fn is_fresh_at(&self, ttl: Duration, now: SystemTime) -> bool {
        self.age_at(now) <= ttl
    }
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache directory
/// (`~/.cache/sweezy/` on Linux), one file per [`CacheKey`]. Writes replace the
/// whole file atomically, so concurrent writers race harmlessly to last-write-wins
/// and readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "sweezy")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    pub fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Writes data to the cache, replacing any previous entry for `key`
    ///
    /// The value is written to a temporary file in the cache directory and then
    /// renamed over the target, so the entry is either the old or the new value.
    pub fn write<T: Serialize>(&self, key: &CacheKey, data: &T) -> io::Result<()> {
        self.ensure_dir()?;

        let json = serde_json::to_vec(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.cache_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Reads data from the cache regardless of age
    ///
    /// Returns `None` if the entry doesn't exist or cannot be parsed.
    pub fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CachedData<T>> {
        let path = self.cache_path(key);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let content = fs::read(&path).ok()?;
        let data: T = serde_json::from_slice(&content).ok()?;

        Some(CachedData {
            data,
            cached_at: DateTime::<Utc>::from(modified),
            modified,
        })
    }

    /// Reads the entry for `key` only if it is no older than `ttl`
    pub fn read_fresh<T: DeserializeOwned>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        self.read_fresh_at(key, ttl, SystemTime::now())
    }

    /// Like [`CacheManager::read_fresh`], evaluated at an explicit point in time
    pub fn read_fresh_at<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        now: SystemTime,
    ) -> Option<T> {
        let cached = self.read(key)?;
        if cached.is_fresh_at(ttl, now) {
            Some(cached.data)
        } else {
            tracing::debug!(key = %key, age_secs = cached.age_at(now).as_secs(), "cache entry expired");
            None
        }
    }

    /// Removes the entry for `key`. Missing entries are not an error.
    pub fn remove(&self, key: &CacheKey) -> io::Result<()> {
        match fs::remove_file(self.cache_path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Removes every cache entry, returning how many were deleted
    pub fn clear(&self) -> io::Result<usize> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
