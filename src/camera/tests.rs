use super::*;
use crate::config::{CameraConfig, CameraSource};
use crate::error::PhotoDbError;
use std::sync::Arc;

fn create_test_camera_config() -> CameraConfig {
    CameraConfig {
        source: CameraSource::Synthetic,
        index: 0,
        resolution: (64, 48),
        fps: 30,
        first_frame_timeout_ms: 500,
    }
}

#[tokio::test]
async fn test_synthetic_stream_delivers_frames() {
    let camera = CameraInterface::new(create_test_camera_config())
        .await
        .unwrap();

    let mut stream = camera.start_stream().await.unwrap();
    assert!(stream.is_live());
    assert_eq!(stream.source(), "synthetic");

    let frame = stream.latest_frame().unwrap();
    assert_eq!((frame.width, frame.height), (64, 48));
    assert!(frame.validate_size());

    stream.stop();
    assert!(!stream.is_live());
}

#[tokio::test]
async fn test_capture_frame_scales_to_canvas() {
    let camera = CameraInterface::new(create_test_camera_config())
        .await
        .unwrap();
    let stream = camera.start_stream().await.unwrap();
    let mut canvas = Canvas::new(32, 24);
    assert!(canvas.is_blank());

    camera.capture_frame(&stream, &mut canvas).unwrap();

    assert_eq!((canvas.width(), canvas.height()), (32, 24));
    assert!(!canvas.is_blank());
    assert_eq!(camera.frame_count(), 1);
}

#[tokio::test]
async fn test_capture_from_stopped_stream_fails() {
    let camera = CameraInterface::new(create_test_camera_config())
        .await
        .unwrap();
    let mut stream = camera.start_stream().await.unwrap();
    stream.stop();

    let mut canvas = Canvas::new(32, 24);
    let result = camera.capture_frame(&stream, &mut canvas);

    assert!(matches!(result, Err(PhotoDbError::DeviceUnavailable { .. })));
    assert!(canvas.is_blank());
}

#[tokio::test]
async fn test_denied_camera_reports_device_unavailable() {
    let camera = CameraInterfaceBuilder::new()
        .config(create_test_camera_config())
        .source(Arc::new(UnavailableSource::new("permission denied")))
        .build()
        .await
        .unwrap();

    match camera.start_stream().await {
        Err(PhotoDbError::DeviceUnavailable { details }) => {
            assert!(details.contains("permission denied"));
        }
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Expected camera access to be denied"),
    }
}

struct SilentSource;

struct SilentStream;

impl VideoStream for SilentStream {
    fn latest_frame(&self) -> Option<crate::frame::FrameData> {
        None
    }

    fn is_live(&self) -> bool {
        true
    }

    fn stop(&mut self) {}
}

#[async_trait::async_trait]
impl VideoSource for SilentSource {
    fn name(&self) -> &'static str {
        "silent"
    }

    async fn open(&self, _config: &CameraConfig) -> crate::error::Result<Box<dyn VideoStream>> {
        Ok(Box::new(SilentStream))
    }
}

#[tokio::test]
async fn test_stream_without_frames_times_out() {
    let mut config = create_test_camera_config();
    config.first_frame_timeout_ms = 50;
    let camera = CameraInterface::with_source(config, Arc::new(SilentSource));

    let result = camera.start_stream().await;
    assert!(matches!(result, Err(PhotoDbError::DeviceUnavailable { .. })));
}

#[tokio::test]
async fn test_camera_builder_validation() {
    let builder = CameraInterfaceBuilder::new();

    // Should fail without config
    let result = builder.build().await;
    assert!(result.is_err());

    if let Err(PhotoDbError::System { message }) = result {
        assert!(message.contains("Camera configuration must be specified"));
    } else {
        panic!("Expected system error for missing configuration");
    }
}

#[test]
fn test_canvas_png_encoding() {
    use image::GenericImageView;

    let canvas = Canvas::new(4, 4);
    let png = canvas.to_png().unwrap();

    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 4));
}
