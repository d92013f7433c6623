use super::assets::{CacheStatus, CacheStorage, CachedResponse};
use super::fetcher::AssetFetcher;
use crate::config::CacheConfig;
use crate::error::Result;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of the offline cache worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, install not run yet
    Parsed,
    Installing,
    Installed,
    Active,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Active => "active",
        };
        f.write_str(name)
    }
}

/// Outcome of pre-populating the cache
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Cache-first request handler with a fixed install-time manifest
pub struct OfflineCacheWorker {
    config: CacheConfig,
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn AssetFetcher>,
    state: RwLock<WorkerState>,
    controlling: AtomicBool,
}

impl OfflineCacheWorker {
    pub fn new(config: CacheConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            config,
            storage: Arc::new(CacheStorage::new()),
            fetcher,
            state: RwLock::new(WorkerState::Parsed),
            controlling: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    /// Whether requests are currently routed through the cache
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::Acquire)
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write();
        debug!("Offline cache worker {} -> {}", *current, state);
        *current = state;
    }

    /// Fetch the whole manifest into the named cache.
    ///
    /// The manifest is cached all-or-nothing: if any asset cannot be fetched
    /// the error is logged, nothing is cached, and installation still
    /// completes.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing);
        info!(
            "Installing offline cache '{}' with {} assets",
            self.config.name,
            self.config.assets.len()
        );

        let cache = self.storage.open(&self.config.name);
        let mut fetched = Vec::with_capacity(self.config.assets.len());
        let mut report = InstallReport::default();

        for asset in &self.config.assets {
            match self.fetcher.fetch(asset).await {
                Ok(response) if response.is_ok() => fetched.push((asset.clone(), response)),
                Ok(response) => report
                    .failed
                    .push((asset.clone(), format!("HTTP status {}", response.status))),
                Err(e) => report.failed.push((asset.clone(), e.to_string())),
            }
        }

        if report.failed.is_empty() {
            report.cached = fetched.iter().map(|(path, _)| path.clone()).collect();
            cache.put_all(fetched);
            info!(
                "Cached {} assets in '{}'",
                report.cached.len(),
                self.config.name
            );
        } else {
            for (asset, reason) in &report.failed {
                error!("Failed to cache {}: {}", asset, reason);
            }
            warn!(
                "Offline cache '{}' left empty: {} of {} assets failed",
                self.config.name,
                report.failed.len(),
                self.config.assets.len()
            );
        }

        self.set_state(WorkerState::Installed);
        report
    }

    /// Become active and take over request handling immediately
    pub fn activate(&self) {
        self.set_state(WorkerState::Active);
        self.controlling.store(true, Ordering::Release);
        info!("Offline cache worker active and controlling requests");
    }

    /// Install and activate without waiting for existing clients to go away
    pub async fn start(&self) -> InstallReport {
        let report = self.install().await;
        self.activate();
        report
    }

    /// Answer a request: cache first, then the network.
    ///
    /// Network responses are passed through without being cached, so a cache
    /// miss stays a miss until the next install.
    pub async fn handle_fetch(&self, path: &str) -> Result<CachedResponse> {
        if self.state() == WorkerState::Active && self.is_controlling() {
            if let Some(response) = self.storage.lookup(path) {
                trace!("Cache hit for {}", path);
                return Ok(response);
            }
            trace!("Cache miss for {}", path);
        }

        self.fetcher.fetch(path).await.map_err(|e| {
            warn!("Network fetch for {} failed: {}", path, e);
            e
        })
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            state: self.state().to_string(),
            controlling: self.is_controlling(),
            cache: self.config.name.clone(),
            cached_assets: self.storage.open(&self.config.name).keys(),
        }
    }
}
