use super::*;
use crate::config::CacheConfig;
use crate::error::{PhotoDbError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Origin that can be switched off to simulate losing the network
struct FakeOrigin {
    assets: HashMap<String, &'static str>,
    online: AtomicBool,
    requests: AtomicUsize,
}

impl FakeOrigin {
    fn new() -> Self {
        let mut assets = HashMap::new();
        assets.insert("index.html".to_string(), "<html>photodb</html>");
        assets.insert("manifest.json".to_string(), "{\"name\":\"photodb\"}");
        assets.insert("app.js".to_string(), "console.log('hi')");
        Self {
            assets,
            online: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    fn go_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetFetcher for FakeOrigin {
    async fn fetch(&self, path: &str) -> Result<CachedResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(PhotoDbError::AssetFetchFailed {
                path: path.to_string(),
                details: "network unreachable".to_string(),
            });
        }

        match self.assets.get(&cache_key(path)) {
            Some(body) => Ok(CachedResponse::ok(content_type_for(path), *body)),
            None => Ok(CachedResponse {
                status: 404,
                content_type: "text/plain".to_string(),
                body: "Not Found".into(),
            }),
        }
    }
}

fn create_test_config() -> CacheConfig {
    CacheConfig {
        name: "Demo".to_string(),
        assets: vec!["index.html".to_string(), "manifest.json".to_string()],
        origin: None,
        asset_dir: None,
        ip: "127.0.0.1".to_string(),
        port: 8081,
    }
}

#[tokio::test]
async fn test_lifecycle_states() {
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(create_test_config(), origin);
    assert_eq!(worker.state(), WorkerState::Parsed);

    let report = worker.install().await;
    assert_eq!(worker.state(), WorkerState::Installed);
    assert!(!worker.is_controlling());
    assert_eq!(report.cached, vec!["index.html", "manifest.json"]);
    assert!(report.failed.is_empty());

    worker.activate();
    assert_eq!(worker.state(), WorkerState::Active);
    assert!(worker.is_controlling());
}

#[tokio::test]
async fn test_serves_manifest_asset_while_offline() {
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(create_test_config(), origin.clone());
    worker.start().await;

    origin.go_offline();

    let response = worker.handle_fetch("/index.html").await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<html>photodb</html>");
    assert_eq!(response.content_type, "text/html; charset=utf-8");
}

#[tokio::test]
async fn test_unlisted_asset_falls_through_to_network_error() {
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(create_test_config(), origin.clone());
    worker.start().await;

    origin.go_offline();

    let result = worker.handle_fetch("/app.js").await;
    assert!(matches!(result, Err(PhotoDbError::AssetFetchFailed { .. })));
}

#[tokio::test]
async fn test_network_fallback_is_not_cached() {
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(create_test_config(), origin.clone());
    worker.start().await;

    let online = worker.handle_fetch("/app.js").await.unwrap();
    assert_eq!(online.status, 200);
    assert!(worker.storage().lookup("app.js").is_none());

    origin.go_offline();
    assert!(worker.handle_fetch("/app.js").await.is_err());
}

#[tokio::test]
async fn test_failed_asset_leaves_cache_empty_but_installs() {
    let mut config = create_test_config();
    config.assets.push("missing.css".to_string());
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(config, origin);

    let report = worker.start().await;

    assert_eq!(worker.state(), WorkerState::Active);
    assert!(report.cached.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "missing.css");
    assert!(worker.storage().open("Demo").is_empty());
}

#[tokio::test]
async fn test_inactive_worker_goes_to_network() {
    let origin = Arc::new(FakeOrigin::new());
    let worker = OfflineCacheWorker::new(create_test_config(), origin.clone());
    worker.install().await;
    let before = origin.requests.load(Ordering::SeqCst);

    worker.handle_fetch("/index.html").await.unwrap();

    assert_eq!(origin.requests.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn test_dir_fetcher_reads_files_and_blocks_traversal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    let fetcher = DirFetcher::new(dir.path());

    let found = fetcher.fetch("/index.html").await.unwrap();
    assert_eq!(found.status, 200);
    assert_eq!(found.body, "<html></html>");

    let missing = fetcher.fetch("/manifest.json").await.unwrap();
    assert_eq!(missing.status, 404);

    let escaped = fetcher.fetch("/../etc/passwd").await.unwrap();
    assert_eq!(escaped.status, 404);
}

#[tokio::test]
async fn test_dir_fetcher_directories_are_not_found() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("icons")).unwrap();
    let fetcher = DirFetcher::new(dir.path());

    assert_eq!(fetcher.fetch("/").await.unwrap().status, 404);
    assert_eq!(fetcher.fetch("/icons").await.unwrap().status, 404);
}

#[tokio::test]
async fn test_dir_fetcher_unreachable_root() {
    let dir = TempDir::new().unwrap();
    let fetcher = DirFetcher::new(dir.path().join("gone"));

    let result = fetcher.fetch("/index.html").await;
    assert!(matches!(result, Err(PhotoDbError::AssetFetchFailed { .. })));
}

#[test]
fn test_cache_storage_reuses_named_cache() {
    let storage = CacheStorage::new();
    let first = storage.open("Demo");
    first.put("/index.html", CachedResponse::ok("text/html", "x"));

    let second = storage.open("Demo");
    assert_eq!(second.len(), 1);
    assert_eq!(second.keys(), vec!["index.html"]);
    assert_eq!(storage.names(), vec!["Demo"]);
}

#[cfg(feature = "offline_cache")]
mod server_tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn started_server(origin: Arc<FakeOrigin>) -> CacheServer {
        let worker = Arc::new(OfflineCacheWorker::new(create_test_config(), origin));
        worker.start().await;
        CacheServer::new(create_test_config(), worker)
    }

    #[tokio::test]
    async fn test_router_serves_cached_asset_offline() {
        let origin = Arc::new(FakeOrigin::new());
        let server = started_server(origin.clone()).await;
        origin.go_offline();

        let response = server
            .router()
            .oneshot(Request::get("/manifest.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"name\":\"photodb\"}");
    }

    #[tokio::test]
    async fn test_router_reports_bad_gateway_offline() {
        let origin = Arc::new(FakeOrigin::new());
        let server = started_server(origin.clone()).await;
        origin.go_offline();

        let response = server
            .router()
            .oneshot(Request::get("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let server = started_server(Arc::new(FakeOrigin::new())).await;

        let response = server
            .router()
            .oneshot(Request::get("/__worker/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status["state"], "active");
        assert_eq!(status["controlling"], true);
        assert_eq!(
            status["cached_assets"],
            serde_json::json!(["index.html", "manifest.json"])
        );
    }

    #[test]
    fn test_http_fetcher_rejects_bad_origin() {
        assert!(HttpFetcher::new("not a url").is_err());
        assert!(HttpFetcher::new("http://127.0.0.1:8000").is_ok());
    }
}
