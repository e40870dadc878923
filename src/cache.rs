//! Time-bounded memoization for provider search calls.
//!
//! The cache sits in front of the idempotent `search` operation only; nothing
//! mutating goes through it. Keys are a stable hash over the operation name
//! and the string forms of all arguments. There is no size bound and no LRU:
//! one discovery session is short-lived and its argument space is small.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::SourceResult;

struct CacheEntry {
    value: Vec<SourceResult>,
    inserted_at: Instant,
}

/// In-memory search-result cache with a fixed TTL (default 300 s).
pub struct SearchCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Derive a deterministic cache key from an operation name and its
    /// arguments' string forms.
    pub fn make_key(operation: &str, args: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        for arg in args {
            hasher.update(b"|");
            hasher.update(arg.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Return the cached value if present and unexpired. Expired entries are
    /// evicted on access.
    pub fn get(&self, key: &str) -> Option<Vec<SourceResult>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                debug!(key = &key[..8.min(key.len())], "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value, overwriting any existing entry unconditionally.
    pub fn set(&self, key: &str, value: Vec<SourceResult>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
