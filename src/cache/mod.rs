//! Cache module for storing API responses to disk
//!
//! This module provides a cache manager that persists decoded API responses to
//! the filesystem, one file per key, using the file's modification time as the
//! write timestamp. [`cached_search`] layers a network-first, cache-fallback
//! policy on top for idempotent read queries.

mod key;
mod manager;
mod search;

pub use key::CacheKey;
pub use manager::{CacheManager, CachedData};
pub use search::cached_search;
