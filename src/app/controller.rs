use super::types::AppStats;
use crate::camera::{CameraInterface, Canvas, LiveStream, VideoSource};
use crate::config::PhotoDbConfig;
use crate::error::{PhotoDbError, Result};
use crate::export::ExportService;
use crate::record::RecordService;
use crate::storage::{PhotoRecord, PhotoStore, TimestampRange};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Page-level coordinator: one store, one camera, one canvas
pub struct PhotoDbApp {
    config: PhotoDbConfig,
    store: PhotoStore,
    camera: CameraInterface,
    canvas: Canvas,
    stream: Option<LiveStream>,
    records: RecordService,
    exports: ExportService,
}

impl PhotoDbApp {
    /// Open the store and set up the camera named in the configuration
    pub async fn open(config: PhotoDbConfig) -> Result<Self> {
        let store = PhotoStore::open(&config.storage).await.map_err(|e| {
            error!("Error opening database: {}", e);
            e
        })?;
        let camera = CameraInterface::new(config.camera.clone()).await?;
        Ok(Self::assemble(config, store, camera))
    }

    /// Open with an explicit video source instead of the configured one
    pub async fn open_with_source(
        config: PhotoDbConfig,
        source: Arc<dyn VideoSource>,
    ) -> Result<Self> {
        let store = PhotoStore::open(&config.storage).await?;
        let camera = CameraInterface::with_source(config.camera.clone(), source);
        Ok(Self::assemble(config, store, camera))
    }

    fn assemble(config: PhotoDbConfig, store: PhotoStore, camera: CameraInterface) -> Self {
        let canvas = Canvas::new(config.canvas.width, config.canvas.height);
        let records = RecordService::new(store.clone(), config.record.clone());
        let exports = ExportService::new(store.clone());

        Self {
            config,
            store,
            camera,
            canvas,
            stream: None,
            records,
            exports,
        }
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Whether a live stream is attached
    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(LiveStream::is_live)
    }

    /// Acquire the camera; a stream that is already live is reused
    pub async fn start_camera(&mut self) -> Result<()> {
        if self.is_streaming() {
            return Ok(());
        }

        let stream = self.camera.start_stream().await.map_err(|e| {
            error!("Error accessing camera: {}", e);
            e
        })?;
        info!("Camera stream started from {} source", stream.source());
        self.stream = Some(stream);
        Ok(())
    }

    /// Copy the current live frame into the canvas
    pub fn snap(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| PhotoDbError::device_unavailable("camera stream not started"))?;
        self.camera.capture_frame(stream, &mut self.canvas)
    }

    /// Save whatever is on the canvas and display the stored record
    pub async fn save(&self, description: Option<&str>) -> Result<PhotoRecord> {
        if self.canvas.is_blank() {
            warn!("Saving a blank canvas; no frame has been captured");
        }

        let description = description.unwrap_or_else(|| self.records.default_description());
        let record = self.records.save_capture(&self.canvas, description).await?;
        // The record is already stored; a failed preview does not undo the save
        if let Err(e) = self.records.display(&record).await {
            error!("Error displaying photo {}: {}", record.id, e);
        }
        Ok(record)
    }

    /// Start the camera if needed, snap one frame, and save it
    pub async fn capture(&mut self, description: Option<&str>) -> Result<PhotoRecord> {
        self.start_camera().await?;
        self.snap()?;
        self.save(description).await
    }

    /// Records within `range` (the configured default range when `None`),
    /// ordered by timestamp
    pub async fn query(&self, range: Option<TimestampRange>) -> Result<Vec<PhotoRecord>> {
        let range = match range {
            Some(range) => range,
            None => TimestampRange::parse(&self.config.query.lower, &self.config.query.upper)?,
        };

        let records = self.store.query_range(range.clone()).collect().await.map_err(|e| {
            error!("Error querying database: {}", e);
            e
        })?;

        for record in &records {
            info!(
                id = record.id,
                timestamp = %record.timestamp,
                description = %record.description,
                "Found record"
            );
        }
        info!(
            "{} records between {} and {}",
            records.len(),
            range.lower(),
            range.upper()
        );
        Ok(records)
    }

    /// Write the export file into `directory` (the configured one when `None`)
    pub async fn export(&self, directory: Option<&Path>) -> Result<PathBuf> {
        let directory = directory
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export.directory));
        self.exports.write_export(&directory).await
    }

    pub async fn stats(&self) -> Result<AppStats> {
        let photos = self.store.count().await?;
        let estimate = self.store.estimate().await?;
        Ok(AppStats::new(
            self.store.location(),
            photos,
            estimate,
            self.camera.frame_count(),
        ))
    }

    /// Release the camera and close the store
    pub async fn close(mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            info!("Releasing camera after {:?}", stream.uptime());
            stream.stop();
        }
        let Self { store, .. } = self;
        store.close().await
    }
}
