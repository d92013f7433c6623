use bytes::Bytes;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A response kept (or about to be kept) in an asset cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn ok<S: Into<String>>(content_type: S, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cache keys are request paths without the leading slash
pub fn cache_key(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

/// One named cache of request path -> response
#[derive(Debug)]
pub struct AssetCache {
    name: String,
    entries: RwLock<BTreeMap<String, CachedResponse>>,
}

impl AssetCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn put(&self, path: &str, response: CachedResponse) {
        self.entries.write().insert(cache_key(path), response);
    }

    /// Store a batch of responses at once
    pub fn put_all(&self, responses: Vec<(String, CachedResponse)>) {
        let mut entries = self.entries.write();
        for (path, response) in responses {
            entries.insert(cache_key(&path), response);
        }
    }

    pub fn lookup(&self, path: &str) -> Option<CachedResponse> {
        self.entries.read().get(&cache_key(path)).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// All named caches of one worker
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, Arc<AssetCache>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cache called `name`, creating it if needed
    pub fn open(&self, name: &str) -> Arc<AssetCache> {
        if let Some(cache) = self.caches.read().get(name) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write();
        Arc::clone(
            caches
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AssetCache::new(name))),
        )
    }

    /// Look a path up across every cache
    pub fn lookup(&self, path: &str) -> Option<CachedResponse> {
        self.caches
            .read()
            .values()
            .find_map(|cache| cache.lookup(path))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Snapshot returned by the worker status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub state: String,
    pub controlling: bool,
    pub cache: String,
    pub cached_assets: Vec<String>,
}
