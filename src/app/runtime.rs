use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[cfg(feature = "offline_cache")]
use crate::cache::{AssetFetcher, CacheServer, DirFetcher, HttpFetcher, OfflineCacheWorker};
#[cfg(feature = "offline_cache")]
use crate::config::CacheConfig;
#[cfg(feature = "offline_cache")]
use crate::error::{PhotoDbError, Result};
#[cfg(feature = "offline_cache")]
use std::sync::Arc;

/// Token cancelled on SIGINT or SIGTERM
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();

    // Handle SIGTERM (systemd stop) - Unix only
    #[cfg(unix)]
    {
        let sigterm_token = token.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        sigterm_token.cancel();
                    }
                }
                Err(e) => error!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    let sigint_token = token.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            sigint_token.cancel();
        }
    });

    token
}

/// Build the fetcher for the configured origin: a local directory wins over
/// an HTTP origin
#[cfg(feature = "offline_cache")]
fn select_fetcher(config: &CacheConfig) -> Result<Arc<dyn AssetFetcher>> {
    if let Some(dir) = &config.asset_dir {
        info!("Serving offline cache assets from directory {}", dir);
        return Ok(Arc::new(DirFetcher::new(dir)));
    }

    if let Some(origin) = &config.origin {
        info!("Serving offline cache assets from origin {}", origin);
        return Ok(Arc::new(HttpFetcher::new(origin)?));
    }

    Err(PhotoDbError::component(
        "offline_cache",
        "either cache.asset_dir or cache.origin must be set",
    ))
}

/// Install and activate the worker, then serve until `shutdown` is cancelled
#[cfg(feature = "offline_cache")]
pub async fn serve_offline_cache(config: CacheConfig, shutdown: CancellationToken) -> Result<()> {
    let fetcher = select_fetcher(&config)?;
    let worker = Arc::new(OfflineCacheWorker::new(config.clone(), fetcher));

    let report = worker.start().await;
    if !report.failed.is_empty() {
        error!(
            "Offline cache installed without assets; {} failed",
            report.failed.len()
        );
    }

    let server = CacheServer::new(config, worker);
    server.start(shutdown).await
}
