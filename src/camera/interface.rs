use super::canvas::Canvas;
use super::source::{select_source, VideoSource, VideoStream};
use crate::config::CameraConfig;
use crate::error::{PhotoDbError, Result};
use crate::frame::FrameData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Handle to a running camera stream
pub struct LiveStream {
    inner: Box<dyn VideoStream>,
    source: &'static str,
    started_at: Instant,
}

impl LiveStream {
    pub fn latest_frame(&self) -> Option<FrameData> {
        self.inner.latest_frame()
    }

    pub fn is_live(&self) -> bool {
        self.inner.is_live()
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stop the underlying device
    pub fn stop(&mut self) {
        if self.inner.is_live() {
            info!("Stopping {} camera stream", self.source);
            self.inner.stop();
        }
    }
}

/// Camera access: acquire a stream and snapshot frames from it
pub struct CameraInterface {
    config: CameraConfig,
    source: Arc<dyn VideoSource>,
    frames_captured: AtomicU64,
}

impl CameraInterface {
    /// Create a camera interface using the source named in the configuration
    pub async fn new(config: CameraConfig) -> Result<Self> {
        let source = select_source(&config);
        Ok(Self::with_source(config, source))
    }

    /// Create a camera interface over an explicit source
    pub fn with_source(config: CameraConfig, source: Arc<dyn VideoSource>) -> Self {
        info!(
            "Initializing {} camera interface for device {} ({}x{} @ {}fps)",
            source.name(),
            config.index,
            config.resolution.0,
            config.resolution.1,
            config.fps
        );

        Self {
            config,
            source,
            frames_captured: AtomicU64::new(0),
        }
    }

    /// Acquire the camera and wait until it delivers its first frame
    pub async fn start_stream(&self) -> Result<LiveStream> {
        info!("Starting {} camera stream", self.source.name());

        let inner = self.source.open(&self.config).await.map_err(|e| match e {
            PhotoDbError::DeviceUnavailable { .. } => e,
            other => PhotoDbError::device_unavailable(other.to_string()),
        })?;

        let mut stream = LiveStream {
            inner,
            source: self.source.name(),
            started_at: Instant::now(),
        };

        let timeout = Duration::from_millis(self.config.first_frame_timeout_ms);
        let deadline = Instant::now() + timeout;

        while stream.latest_frame().is_none() {
            if Instant::now() >= deadline {
                warn!("No camera frames received within {:?}", timeout);
                stream.stop();
                return Err(PhotoDbError::device_unavailable(format!(
                    "no frames received from {} camera within {:?}",
                    stream.source, timeout
                )));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        debug!(
            "Camera stream ready after {:?}",
            stream.started_at.elapsed()
        );
        Ok(stream)
    }

    /// Copy the current live frame into the canvas
    pub fn capture_frame(&self, stream: &LiveStream, canvas: &mut Canvas) -> Result<()> {
        if !stream.is_live() {
            return Err(PhotoDbError::device_unavailable("camera stream is stopped"));
        }

        let frame = stream
            .latest_frame()
            .ok_or_else(|| PhotoDbError::device_unavailable("no live frame available"))?;

        canvas.draw_frame(&frame)?;
        self.frames_captured.fetch_add(1, Ordering::Relaxed);

        trace!(
            "Captured frame {} ({}x{}, {}ms old) into {}x{} canvas",
            frame.id,
            frame.width,
            frame.height,
            frame.age_ms(),
            canvas.width(),
            canvas.height()
        );

        Ok(())
    }

    /// Get camera configuration
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Number of frames copied into a canvas so far
    pub fn frame_count(&self) -> u64 {
        self.frames_captured.load(Ordering::Relaxed)
    }
}
