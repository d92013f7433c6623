use super::*;
use crate::camera::UnavailableSource;
use crate::config::{CameraSource, PhotoDbConfig};
use crate::error::PhotoDbError;
use crate::export::{decode_data_url, ExportedRecord, EXPORT_FILENAME};
use crate::storage::TimestampRange;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_config(dir: &TempDir) -> PhotoDbConfig {
    let mut config = PhotoDbConfig::default();
    config.camera.source = CameraSource::Synthetic;
    config.camera.resolution = (64, 48);
    config.camera.first_frame_timeout_ms = 500;
    config.canvas.width = 32;
    config.canvas.height = 24;
    config.storage.path = dir.path().join("PhotoDB.sqlite").display().to_string();
    config.storage.cursor_batch_size = 2;
    config.export.directory = dir.path().display().to_string();
    config
}

fn around_now() -> TimestampRange {
    let now = Utc::now();
    TimestampRange::new(now - Duration::minutes(1), now + Duration::minutes(1)).unwrap()
}

#[tokio::test]
async fn test_capture_stores_and_queries_photo() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let record = app.capture(Some("front door")).await.unwrap();

    assert!(app.is_streaming());
    assert!(!app.canvas().is_blank());
    assert_eq!(record.description, "front door");
    assert_eq!(record.image.mime_type, "image/png");

    let found = app.query(Some(around_now())).await.unwrap();
    assert_eq!(found, vec![record]);

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_save_uses_default_description() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    app.start_camera().await.unwrap();
    app.snap().unwrap();
    let record = app.save(None).await.unwrap();

    assert_eq!(record.description, "Sample photo description");
}

#[tokio::test]
async fn test_save_without_snap_stores_blank_canvas() {
    let dir = TempDir::new().unwrap();
    let app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let record = app.save(Some("blank")).await.unwrap();
    let decoded = image::load_from_memory(&record.image.bytes).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (32, 24));
    assert!(decoded.as_raw().iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_failed_preview_still_saves() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let mut config = create_test_config(&dir);
    config.record.preview_path = Some(blocker.join("preview.png").display().to_string());
    let mut app = PhotoDbApp::open(config).await.unwrap();

    let record = app.capture(Some("kept")).await.unwrap();

    assert_eq!(app.store().get(record.id).await.unwrap(), record);
    assert!(!blocker.join("preview.png").exists());
}

#[tokio::test]
async fn test_snap_before_start_fails() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let result = app.snap();
    assert!(matches!(result, Err(PhotoDbError::DeviceUnavailable { .. })));
}

#[tokio::test]
async fn test_denied_camera_creates_no_record() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(UnavailableSource::new("permission denied"));
    let mut app = PhotoDbApp::open_with_source(create_test_config(&dir), source)
        .await
        .unwrap();

    let result = app.capture(Some("never stored")).await;

    assert!(matches!(result, Err(PhotoDbError::DeviceUnavailable { .. })));
    assert!(!app.is_streaming());
    assert_eq!(app.stats().await.unwrap().photos, 0);
}

#[tokio::test]
async fn test_default_query_range_on_fresh_store() {
    let dir = TempDir::new().unwrap();
    let app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let found = app.query(None).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_export_writes_every_capture() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let first = app.capture(Some("one")).await.unwrap();
    let second = app.capture(Some("two")).await.unwrap();
    let third = app.capture(Some("three")).await.unwrap();

    let path = app.export(None).await.unwrap();
    assert_eq!(path, dir.path().join(EXPORT_FILENAME));

    let contents = std::fs::read_to_string(&path).unwrap();
    let exported: Vec<ExportedRecord> = serde_json::from_str(&contents).unwrap();

    assert_eq!(exported.len(), 3);
    for (exported, original) in exported.iter().zip([&first, &second, &third]) {
        assert_eq!(exported.id, original.id);
        assert_eq!(exported.description, original.description);
        assert_eq!(decode_data_url(&exported.image).unwrap(), original.image);
    }
}

#[tokio::test]
async fn test_export_to_explicit_directory() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();

    let path = app.export(Some(out.path())).await.unwrap();

    assert_eq!(path, out.path().join(EXPORT_FILENAME));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
}

#[tokio::test]
async fn test_stats_reports_usage() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();
    app.capture(None).await.unwrap();

    let stats = app.stats().await.unwrap();

    assert_eq!(stats.photos, 1);
    assert_eq!(stats.frames_captured, 1);
    assert!(stats.usage_bytes > 0);
    assert!(stats.location.ends_with("PhotoDB.sqlite"));
}

#[tokio::test]
async fn test_reopen_keeps_records() {
    let dir = TempDir::new().unwrap();
    let mut app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();
    let saved = app.capture(Some("persisted")).await.unwrap();
    app.close().await.unwrap();

    let app = PhotoDbApp::open(create_test_config(&dir)).await.unwrap();
    let stored = app.store().get(saved.id).await.unwrap();

    assert_eq!(stored, saved);
}
