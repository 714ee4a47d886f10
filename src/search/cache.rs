use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::models::AnalyzeResponse;

/// Canonical form of a trace: `\r\n` and `\r` become `\n`, outer whitespace trimmed.
pub fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// SHA-256 hex digest of an already normalized trace.
pub fn cache_key(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Bounded LRU of analyzed traces. A capacity of zero disables caching.
pub struct ResponseCache {
    inner: Option<Mutex<LruCache<String, AnalyzeResponse>>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self, key: &str) -> Option<AnalyzeResponse> {
        self.inner.as_ref()?.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, response: AnalyzeResponse) {
        if let Some(inner) = &self.inner {
            inner.lock().put(key, response);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
