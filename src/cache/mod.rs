//! Offline asset cache: install a fixed manifest, then serve cache-first
//! with network fallback

mod assets;
mod fetcher;
#[cfg(feature = "offline_cache")]
mod server;
mod worker;
#[cfg(test)]
mod tests;

pub use assets::{cache_key, AssetCache, CacheStatus, CacheStorage, CachedResponse};
#[cfg(feature = "offline_cache")]
pub use fetcher::HttpFetcher;
pub use fetcher::{content_type_for, AssetFetcher, DirFetcher};
#[cfg(feature = "offline_cache")]
pub use server::CacheServer;
pub use worker::{InstallReport, OfflineCacheWorker, WorkerState};
