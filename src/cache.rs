//! Persistent memoisation of completion responses.
//!
//! The cache is a flat JSON object mapping request fingerprints
//! (see [`crate::request::Request::fingerprint`]) to raw response text. It
//! is loaded once when constructed and rewritten in full after every miss.
//! Entries never expire; deleting the file is the only way to invalidate.
//!
//! A cache file that cannot be parsed is treated as empty. The next miss
//! overwrites it with a valid table.
//!
//! The file is not locked. Running two instances against the same cache
//! file at once can lose entries.

use crate::error::SyncError;
use crate::request::Request;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fingerprint → response table, optionally backed by a file.
#[derive(Debug, Default)]
pub struct ResponseCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl ResponseCache {
    /// Load the table from `path`. A missing file yields an empty table; so
    /// does a file that is unreadable or not a JSON string map.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => {
                    debug!("Loaded {} cached responses from {}", map.len(), path.display());
                    map
                }
                Err(e) => {
                    warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored response for this request, if any.
    pub fn get(&self, request: &Request) -> Option<&str> {
        self.entries.get(&request.fingerprint()).map(String::as_str)
    }

    /// Store a response and rewrite the whole table to disk.
    ///
    /// The in-memory entry is kept even when persisting fails.
    pub fn insert(&mut self, request: &Request, response: impl Into<String>) -> Result<(), SyncError> {
        let fingerprint = request.fingerprint();
        debug!("Caching response under {}", fingerprint);
        self.entries.insert(fingerprint, response.into());
        self.persist()
    }

    /// Return the cached response, or run `generate`, cache its result and return it.
    ///
    /// The boolean is `true` when the response came from the cache. A failure
    /// to persist the table is logged and does not fail the call.
    pub fn get_or_generate<F>(&mut self, request: &Request, generate: F) -> Result<(String, bool), SyncError>
    where
        F: FnOnce(&Request) -> Result<String, SyncError>,
    {
        if let Some(hit) = self.get(request) {
            info!("Cache hit, skipping remote call");
            return Ok((hit.to_string(), true));
        }

        info!("Cache miss, calling model");
        let response = generate(request)?;
        if let Err(e) = self.insert(request, response.clone()) {
            warn!("{}", e);
        }
        Ok((response, false))
    }

    /// Full rewrite of the table: temp file in the same directory, then rename.
    fn persist(&self) -> Result<(), SyncError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let write_err = |source| SyncError::CacheWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| SyncError::Internal(format!("cache serialisation: {e}")))?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Message;

    fn request(text: &str) -> Request {
        Request::new(vec![Message::system("rules"), Message::user(text)])
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::load(dir.path().join("cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ this is not json").unwrap();
        assert!(ResponseCache::load(&path).is_empty());
    }

    #[test]
    fn wrong_shape_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, r#"{"abc": 42}"#).unwrap();
        assert!(ResponseCache::load(&path).is_empty());
    }

    #[test]
    fn insert_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let req = request("same input");

        let mut cache = ResponseCache::load(&path);
        cache.insert(&req, "<html>cached</html>").unwrap();

        let reloaded = ResponseCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&req), Some("<html>cached</html>"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_next_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut cache = ResponseCache::load(&path);
        cache.insert(&request("x"), "y").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn hit_does_not_generate() {
        let mut cache = ResponseCache::in_memory();
        let req = request("input");
        let (first, cached) = cache
            .get_or_generate(&req, |_| Ok("response".to_string()))
            .unwrap();
        assert_eq!(first, "response");
        assert!(!cached);

        let (second, cached) = cache
            .get_or_generate(&req, |_| panic!("must not call the model on a hit"))
            .unwrap();
        assert_eq!(second, "response");
        assert!(cached);
    }

    #[test]
    fn failed_generation_is_not_cached() {
        let mut cache = ResponseCache::in_memory();
        let req = request("input");
        let err = cache
            .get_or_generate(&req, |_| {
                Err(SyncError::LlmApiError {
                    message: "bad key".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, SyncError::LlmApiError { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn different_requests_get_different_entries() {
        let mut cache = ResponseCache::in_memory();
        cache.insert(&request("a"), "A").unwrap();
        cache.insert(&request("b"), "B").unwrap();
        assert_eq!(cache.get(&request("a")), Some("A"));
        assert_eq!(cache.get(&request("b")), Some("B"));
    }
}
