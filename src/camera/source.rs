use crate::config::{CameraConfig, CameraSource};
use crate::error::{PhotoDbError, Result};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Something that can hand out a live video stream
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Acquire the device and start producing frames
    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn VideoStream>>;
}

/// A running stream; the newest frame is always available without blocking
pub trait VideoStream: Send + Sync {
    fn latest_frame(&self) -> Option<FrameData>;

    fn is_live(&self) -> bool;

    fn stop(&mut self);
}

/// Pick the source configured for this build
pub fn select_source(config: &CameraConfig) -> Arc<dyn VideoSource> {
    match config.source {
        CameraSource::Synthetic => Arc::new(SyntheticVideoSource),
        #[cfg(all(target_os = "linux", feature = "camera"))]
        CameraSource::V4l2 => Arc::new(super::gst::GstVideoSource),
        #[cfg(not(all(target_os = "linux", feature = "camera")))]
        CameraSource::V4l2 => Arc::new(UnavailableSource::new(
            "photodb was built without V4L2 camera support",
        )),
    }
}

/// Source that always refuses, e.g. when the platform has no camera backend
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl VideoSource for UnavailableSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn open(&self, _config: &CameraConfig) -> Result<Box<dyn VideoStream>> {
        Err(PhotoDbError::device_unavailable(self.reason.clone()))
    }
}

/// Generates a moving RGBA test pattern at the configured frame rate
pub struct SyntheticVideoSource;

impl SyntheticVideoSource {
    /// Render pattern frame `id` at the given resolution
    pub fn pattern_frame(id: u64, width: u32, height: u32) -> FrameData {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.push(((x as u64 + id) % 256) as u8);
                data.push((y % 256) as u8);
                data.push(((id * 4) % 256) as u8);
                data.push(0xFF);
            }
        }
        FrameData::new(id, SystemTime::now(), data, width, height, FrameFormat::Rgba8)
    }
}

#[async_trait]
impl VideoSource for SyntheticVideoSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn VideoStream>> {
        let (width, height) = config.resolution;
        let first = Self::pattern_frame(0, width, height);
        let (tx, rx) = watch::channel(Some(first));
        let token = CancellationToken::new();

        let frame_interval = Duration::from_micros(1_000_000u64 / config.fps.max(1) as u64);
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(frame_interval);
            interval_timer.tick().await;
            let mut frame_id = 1u64;

            info!("Synthetic capture loop started ({}x{})", width, height);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval_timer.tick() => {
                        let frame = SyntheticVideoSource::pattern_frame(frame_id, width, height);
                        trace!("Generated synthetic frame {}", frame_id);
                        if tx.send(Some(frame)).is_err() {
                            break;
                        }
                        frame_id += 1;
                    }
                }
            }

            debug!("Synthetic capture loop stopped after {} frames", frame_id);
        });

        Ok(Box::new(WatchStream::new(rx, token)))
    }
}

/// Stream backed by a watch channel holding the newest frame
pub(crate) struct WatchStream {
    frames: watch::Receiver<Option<FrameData>>,
    token: CancellationToken,
}

impl WatchStream {
    pub(crate) fn new(frames: watch::Receiver<Option<FrameData>>, token: CancellationToken) -> Self {
        Self { frames, token }
    }
}

impl VideoStream for WatchStream {
    fn latest_frame(&self) -> Option<FrameData> {
        self.frames.borrow().clone()
    }

    fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    fn stop(&mut self) {
        self.token.cancel();
    }
}

impl Drop for WatchStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
