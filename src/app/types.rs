use crate::storage::StorageEstimate;
use serde::Serialize;

/// Snapshot reported by the `stats` command
#[derive(Debug, Clone, Serialize)]
pub struct AppStats {
    pub location: String,
    pub photos: u64,
    pub usage_bytes: u64,
    pub available_bytes: u64,
    pub frames_captured: u64,
}

impl AppStats {
    pub(crate) fn new(location: &str, photos: u64, estimate: StorageEstimate, frames: u64) -> Self {
        Self {
            location: location.to_string(),
            photos,
            usage_bytes: estimate.usage_bytes,
            available_bytes: estimate.available_bytes,
            frames_captured: frames,
        }
    }
}
