//! Turning a captured canvas into a stored photo and showing it back

#[cfg(test)]
mod tests;

use crate::camera::Canvas;
use crate::config::RecordConfig;
use crate::error::{PhotoDbError, Result};
use crate::storage::{timestamp_now, NewPhoto, PhotoImage, PhotoRecord, PhotoStore};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Saves captures and reloads them for display
pub struct RecordService {
    store: PhotoStore,
    config: RecordConfig,
}

impl RecordService {
    pub fn new(store: PhotoStore, config: RecordConfig) -> Self {
        Self { store, config }
    }

    /// Description used when the caller does not supply one
    pub fn default_description(&self) -> &str {
        &self.config.default_description
    }

    /// Encode the canvas as PNG, store it, and return the record as read back
    /// from the store rather than the in-memory copy.
    pub async fn save_capture(&self, canvas: &Canvas, description: &str) -> Result<PhotoRecord> {
        let snapshot = canvas.clone();
        let png = tokio::task::spawn_blocking(move || snapshot.to_png())
            .await
            .map_err(|e| PhotoDbError::save_failed(format!("Encoding task failed: {}", e)))?
            .map_err(|e| PhotoDbError::save_failed(e.to_string()))?;

        let photo = NewPhoto {
            timestamp: timestamp_now(),
            description: description.to_string(),
            image: PhotoImage::png(png),
        };
        debug!(
            "Saving {}x{} capture ({} bytes) at {}",
            canvas.width(),
            canvas.height(),
            photo.image.len(),
            photo.timestamp
        );

        let id = self.store.add(photo).await.map_err(|e| {
            error!("Error saving image: {}", e);
            match e {
                PhotoDbError::SaveFailed { .. } => e,
                other => PhotoDbError::save_failed(other.to_string()),
            }
        })?;

        let saved = self.store.get(id).await.map_err(|e| {
            error!("Error fetching saved image {}: {}", id, e);
            e
        })?;

        info!("Saved photo {} at {}", saved.id, saved.timestamp);
        Ok(saved)
    }

    /// Show a record: log its metadata and refresh the preview file if one is configured
    pub async fn display(&self, record: &PhotoRecord) -> Result<Option<PathBuf>> {
        info!(
            id = record.id,
            timestamp = %record.timestamp,
            description = %record.description,
            bytes = record.image.len(),
            "Photo"
        );

        let Some(preview) = &self.config.preview_path else {
            return Ok(None);
        };

        let path = PathBuf::from(preview);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &record.image.bytes).await?;
        debug!("Preview of photo {} written to {}", record.id, path.display());

        Ok(Some(path))
    }
}
