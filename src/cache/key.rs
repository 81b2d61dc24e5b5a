//! Cache keys and their on-disk file names

use std::fmt;

/// Identifies one cache entry
///
/// The raw key is built from the logical query parameters; the file name is
/// derived from a BLAKE3 hash of it, so arbitrary keyword text never reaches
/// the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    raw: String,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            namespace: sanitize(&namespace.into()),
            raw: raw.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `<namespace>-<hash>.json`
    pub fn file_name(&self) -> String {
        let hash = blake3::hash(self.raw.as_bytes());
        format!("{}-{}.json", self.namespace, hash.to_hex())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn sanitize(namespace: &str) -> String {
    let cleaned: String = namespace
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "cache".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_deterministic() {
        let a = CacheKey::new("jobs", "jobs|q=nurse|canton=ZH|page=1|per=20");
        let b = CacheKey::new("jobs", "jobs|q=nurse|canton=ZH|page=1|per=20");
        assert_eq!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_different_keys_map_to_different_files() {
        let a = CacheKey::new("jobs", "jobs|q=nurse|canton=ZH|page=1|per=20");
        let b = CacheKey::new("jobs", "jobs|q=nurse|canton=ZH|page=2|per=20");
        assert_ne!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_file_name_is_filesystem_safe() {
        let key = CacheKey::new("../jobs/é", "q=../../etc/passwd|canton=");
        let name = key.file_name();

        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
        assert!(name.starts_with("___jobs__-"));
        assert!(name.ends_with(".json"));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn test_empty_namespace_gets_default() {
        let key = CacheKey::new("", "x");
        assert!(key.file_name().starts_with("cache-"));
    }
}
