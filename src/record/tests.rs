use super::*;
use crate::camera::{Canvas, SyntheticVideoSource};
use crate::config::RecordConfig;
use crate::storage::PhotoStore;
use tempfile::TempDir;

fn create_test_config(preview_path: Option<String>) -> RecordConfig {
    RecordConfig {
        default_description: "Sample photo description".to_string(),
        preview_path,
    }
}

fn painted_canvas() -> Canvas {
    let mut canvas = Canvas::new(16, 12);
    let frame = SyntheticVideoSource::pattern_frame(3, 32, 24);
    canvas.draw_frame(&frame).unwrap();
    canvas
}

#[tokio::test]
async fn test_save_capture_returns_stored_record() {
    let store = PhotoStore::open_in_memory().await.unwrap();
    let service = RecordService::new(store.clone(), create_test_config(None));
    let canvas = painted_canvas();

    let saved = service.save_capture(&canvas, "front door").await.unwrap();

    assert_eq!(saved.id, 1);
    assert_eq!(saved.description, "front door");
    assert_eq!(saved.image.mime_type, "image/png");
    assert_eq!(saved.image.bytes, canvas.to_png().unwrap());
    assert_eq!(store.get(saved.id).await.unwrap(), saved);
}

#[tokio::test]
async fn test_save_capture_decodes_to_canvas_pixels() {
    let store = PhotoStore::open_in_memory().await.unwrap();
    let service = RecordService::new(store, create_test_config(None));
    let canvas = painted_canvas();

    let saved = service.save_capture(&canvas, "pixels").await.unwrap();
    let decoded = image::load_from_memory(&saved.image.bytes)
        .unwrap()
        .to_rgba8();

    assert_eq!(&decoded, canvas.pixels());
}

#[tokio::test]
async fn test_save_capture_on_closed_store_fails() {
    let store = PhotoStore::open_in_memory().await.unwrap();
    let service = RecordService::new(store.clone(), create_test_config(None));
    store.close().await.unwrap();

    let result = service.save_capture(&painted_canvas(), "lost").await;
    assert!(matches!(result, Err(PhotoDbError::SaveFailed { .. })));
}

#[tokio::test]
async fn test_display_writes_preview() {
    let dir = TempDir::new().unwrap();
    let preview = dir.path().join("preview").join("photo.png");
    let store = PhotoStore::open_in_memory().await.unwrap();
    let service = RecordService::new(
        store,
        create_test_config(Some(preview.to_string_lossy().to_string())),
    );

    let saved = service
        .save_capture(&painted_canvas(), service.default_description())
        .await
        .unwrap();
    let written = service.display(&saved).await.unwrap();

    assert_eq!(written, Some(preview.clone()));
    assert_eq!(std::fs::read(&preview).unwrap(), saved.image.bytes);
    assert_eq!(saved.description, "Sample photo description");
}

#[tokio::test]
async fn test_display_without_preview_path() {
    let store = PhotoStore::open_in_memory().await.unwrap();
    let service = RecordService::new(store, create_test_config(None));
    let saved = service.save_capture(&Canvas::new(2, 2), "blank").await.unwrap();

    assert_eq!(service.display(&saved).await.unwrap(), None);
}
