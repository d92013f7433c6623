use super::assets::CachedResponse;
use crate::error::{PhotoDbError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// The network side of the worker
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch `path` from the origin; unreachable origins are errors,
    /// HTTP error statuses are ordinary responses
    async fn fetch(&self, path: &str) -> Result<CachedResponse>;
}

/// Content type for a file name, by extension
pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Serves assets out of a local directory, standing in for the network
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Map a request path under the root, refusing anything that escapes it
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl AssetFetcher for DirFetcher {
    async fn fetch(&self, path: &str) -> Result<CachedResponse> {
        let Some(file) = self.resolve(path) else {
            debug!("Rejected asset path {}", path);
            return Ok(not_found());
        };

        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            return Err(PhotoDbError::AssetFetchFailed {
                path: path.to_string(),
                details: format!("asset directory {} is unreachable", self.root.display()),
            });
        }

        if tokio::fs::metadata(&file)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Ok(not_found());
        }

        match tokio::fs::read(&file).await {
            Ok(body) => {
                trace!("Read {} ({} bytes)", file.display(), body.len());
                Ok(CachedResponse::ok(content_type_for(path), body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(not_found()),
            Err(e) => Err(PhotoDbError::AssetFetchFailed {
                path: path.to_string(),
                details: e.to_string(),
            }),
        }
    }
}

fn not_found() -> CachedResponse {
    CachedResponse {
        status: 404,
        content_type: "text/plain; charset=utf-8".to_string(),
        body: "Not Found".into(),
    }
}

/// Fetches assets from an upstream HTTP origin
#[cfg(feature = "offline_cache")]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: reqwest::Url,
}

#[cfg(feature = "offline_cache")]
impl HttpFetcher {
    pub fn new(origin: &str) -> Result<Self> {
        // A trailing slash makes relative joins land under the origin path
        let normalized = if origin.ends_with('/') {
            origin.to_string()
        } else {
            format!("{}/", origin)
        };
        let origin = reqwest::Url::parse(&normalized).map_err(|e| {
            PhotoDbError::component("offline_cache", format!("Invalid origin '{}': {}", origin, e))
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            origin,
        })
    }
}

#[cfg(feature = "offline_cache")]
#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<CachedResponse> {
        let fetch_failed = |details: String| PhotoDbError::AssetFetchFailed {
            path: path.to_string(),
            details,
        };

        let url = self
            .origin
            .join(path.trim_start_matches('/'))
            .map_err(|e| fetch_failed(e.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(path).to_string());
        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        debug!("Fetched {} -> {} ({} bytes)", url, status, body.len());

        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}
