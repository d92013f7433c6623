use super::interface::CameraInterface;
use super::source::VideoSource;
use crate::config::CameraConfig;
use crate::error::{PhotoDbError, Result};
use std::sync::Arc;

/// Builder for the camera interface
pub struct CameraInterfaceBuilder {
    config: Option<CameraConfig>,
    source: Option<Arc<dyn VideoSource>>,
}

impl CameraInterfaceBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            source: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the source chosen from the configuration
    pub fn source(mut self, source: Arc<dyn VideoSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub async fn build(self) -> Result<CameraInterface> {
        let config = self
            .config
            .ok_or_else(|| PhotoDbError::system("Camera configuration must be specified"))?;

        match self.source {
            Some(source) => Ok(CameraInterface::with_source(config, source)),
            None => CameraInterface::new(config).await,
        }
    }
}

impl Default for CameraInterfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
