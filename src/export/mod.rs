//! JSON export of every stored photo with images inlined as data URLs


use crate::error::{PhotoDbError, Result};
use crate::storage::{PhotoImage, PhotoRecord, PhotoStore};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Fixed name of the export file
pub const EXPORT_FILENAME: &str = "photoDB_export.json";

/// One photo as it appears in the export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedRecord {
    pub id: i64,
    pub timestamp: String,
    pub description: String,
    /// `data:<mime>;base64,<payload>`
    pub image: String,
}

impl ExportedRecord {
    pub fn from_record(record: PhotoRecord) -> Self {
        Self {
            image: encode_data_url(&record.image),
            id: record.id,
            timestamp: record.timestamp,
            description: record.description,
        }
    }
}

/// Encode an image as a base64 data URL
pub fn encode_data_url(image: &PhotoImage) -> String {
    format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes))
}

/// Decode a base64 data URL produced by [`encode_data_url`]
pub fn decode_data_url(url: &str) -> Result<PhotoImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PhotoDbError::encoding("data URL must start with 'data:'"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoDbError::encoding("data URL has no payload separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoDbError::encoding("only base64 data URLs are supported"))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| PhotoDbError::encoding(format!("Invalid base64 payload: {}", e)))?;

    Ok(PhotoImage::new(mime_type, bytes))
}

/// Serialize records as pretty JSON with two-space indentation
pub fn to_json(records: &[ExportedRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Reads every record out of the store and writes the export file
pub struct ExportService {
    store: PhotoStore,
}

impl ExportService {
    pub fn new(store: PhotoStore) -> Self {
        Self { store }
    }

    /// Every record in insertion order with its image encoded as text.
    ///
    /// Images are encoded on the blocking pool while the cursor keeps reading;
    /// any failure discards the whole result.
    pub async fn export_all(&self) -> Result<Vec<ExportedRecord>> {
        let started = Instant::now();
        let mut cursor = self.store.iterate_all();
        let mut pending = Vec::new();

        while let Some(record) = cursor.next().await.map_err(|e| {
            error!("Error exporting database: {}", e);
            PhotoDbError::export_failed(e.to_string())
        })? {
            pending.push(tokio::task::spawn_blocking(move || {
                ExportedRecord::from_record(record)
            }));
        }

        let exported = futures::future::try_join_all(pending)
            .await
            .map_err(|e| PhotoDbError::export_failed(format!("Encoding task failed: {}", e)))?;

        debug!(
            "Encoded {} records in {:?} ({} cursor pages)",
            exported.len(),
            started.elapsed(),
            cursor.pages_loaded()
        );
        Ok(exported)
    }

    /// Export to `directory/photoDB_export.json`.
    ///
    /// The file is written next to its final name and renamed into place, so a
    /// failed export never leaves a partial file behind.
    pub async fn write_export(&self, directory: &Path) -> Result<PathBuf> {
        let records = self.export_all().await?;
        let json = to_json(&records).map_err(|e| PhotoDbError::export_failed(e.to_string()))?;

        let target = directory.join(EXPORT_FILENAME);
        let staging = directory.join(format!("{}.partial", EXPORT_FILENAME));

        let write = async {
            tokio::fs::create_dir_all(directory).await?;
            tokio::fs::write(&staging, json.as_bytes()).await?;
            tokio::fs::rename(&staging, &target).await
        };

        if let Err(e) = write.await {
            error!("Error writing export to {}: {}", target.display(), e);
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(PhotoDbError::export_failed(format!(
                "Failed to write {}: {}",
                target.display(),
                e
            )));
        }

        info!(
            "Exported {} photos to {} ({} bytes)",
            records.len(),
            target.display(),
            json.len()
        );
        Ok(target)
    }
}
