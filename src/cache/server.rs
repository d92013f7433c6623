use super::worker::OfflineCacheWorker;
use crate::config::CacheConfig;
use crate::error::{PhotoDbError, Result};
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for the Axum server
#[derive(Clone)]
pub struct ServerState {
    pub(crate) worker: Arc<OfflineCacheWorker>,
}

/// HTTP front of the offline cache worker
pub struct CacheServer {
    pub(crate) config: CacheConfig,
    pub(crate) worker: Arc<OfflineCacheWorker>,
}

impl CacheServer {
    pub fn new(config: CacheConfig, worker: Arc<OfflineCacheWorker>) -> Self {
        Self { config, worker }
    }

    /// Routes: worker status plus every other path through the worker
    pub fn router(&self) -> Router {
        let state = ServerState {
            worker: Arc::clone(&self.worker),
        };

        Router::new()
            .route("/__worker/status", get(status_handler))
            .fallback(fetch_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serve until the token is cancelled
    pub async fn start(&self, shutdown: CancellationToken) -> Result<()> {
        let addr = format!("{}:{}", self.config.ip, self.config.port);
        info!("Starting offline cache server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            PhotoDbError::component("offline_cache", format!("Failed to bind {}: {}", addr, e))
        })?;

        info!("Offline cache server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| PhotoDbError::component("offline_cache", format!("Server error: {}", e)))?;

        info!("Offline cache server stopped");
        Ok(())
    }
}

/// Handler for every asset request
async fn fetch_handler(State(state): State<ServerState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match state.worker.handle_fetch(uri.path()).await {
        Ok(cached) => {
            let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                status,
                [(header::CONTENT_TYPE, cached.content_type)],
                cached.body,
            )
                .into_response()
        }
        Err(e) => {
            warn!("Request for {} failed: {}", uri.path(), e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Handler for worker status endpoint
async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.worker.status()))
}
