use super::source::{VideoSource, VideoStream};
use crate::config::CameraConfig;
use crate::error::{PhotoDbError, Result};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::{AppSink, AppSinkCallbacks};
use gstreamer_video::VideoInfo;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{error, info, trace};

/// V4L2 camera read through a GStreamer pipeline that converts to RGBA
pub struct GstVideoSource;

impl GstVideoSource {
    /// Build GStreamer pipeline string for raw RGBA capture
    fn build_pipeline_string(config: &CameraConfig) -> String {
        let (width, height) = config.resolution;

        format!(
            "v4l2src device=/dev/video{} do-timestamp=true ! \
             videoconvert ! videoscale ! \
             video/x-raw,format=RGBA,width={},height={},framerate={}/1 ! \
             appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false",
            config.index, width, height, config.fps
        )
    }
}

#[async_trait]
impl VideoSource for GstVideoSource {
    fn name(&self) -> &'static str {
        "v4l2"
    }

    async fn open(&self, config: &CameraConfig) -> Result<Box<dyn VideoStream>> {
        let device = format!("/dev/video{}", config.index);
        if !Path::new(&device).exists() {
            return Err(PhotoDbError::device_unavailable(format!(
                "camera device {} does not exist",
                device
            )));
        }

        gstreamer::init().map_err(|e| {
            PhotoDbError::device_unavailable(format!("Failed to initialize GStreamer: {}", e))
        })?;

        let pipeline_desc = Self::build_pipeline_string(config);
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| {
                PhotoDbError::device_unavailable(format!("Failed to create pipeline: {}", e))
            })?
            .downcast::<Pipeline>()
            .map_err(|_| PhotoDbError::device_unavailable("Failed to downcast to Pipeline"))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| PhotoDbError::device_unavailable("Pipeline has no appsink"))?
            .downcast::<AppSink>()
            .map_err(|_| PhotoDbError::device_unavailable("Failed to downcast to AppSink"))?;

        let (tx, rx) = watch::channel(None);
        let frame_counter = Arc::new(AtomicU64::new(0));

        appsink.set_callbacks(
            AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame_id = frame_counter.fetch_add(1, Ordering::Relaxed);
                    let frame = FrameData::new(
                        frame_id,
                        SystemTime::now(),
                        map.as_slice().to_vec(),
                        info.width(),
                        info.height(),
                        FrameFormat::Rgba8,
                    );
                    trace!("Captured RGBA frame {} ({} bytes)", frame_id, map.len());

                    // Receiver gone means the stream was dropped; stop pulling.
                    tx.send(Some(frame)).map_err(|_| gstreamer::FlowError::Flushing)?;
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            let _ = pipeline.set_state(gstreamer::State::Null);
            PhotoDbError::device_unavailable(format!(
                "Failed to start camera {} (permission denied or device busy?): {}",
                device, e
            ))
        })?;

        info!("GStreamer pipeline started for {}", device);

        Ok(Box::new(GstStream {
            pipeline,
            frames: rx,
            live: true,
        }))
    }
}

struct GstStream {
    pipeline: Pipeline,
    frames: watch::Receiver<Option<FrameData>>,
    live: bool,
}

impl VideoStream for GstStream {
    fn latest_frame(&self) -> Option<FrameData> {
        self.frames.borrow().clone()
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!("Failed to stop GStreamer pipeline: {}", e);
        }
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        self.stop();
    }
}
