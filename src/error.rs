use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoDbError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config serialization error: {0}")]
    ConfigSerialization(#[from] toml::ser::Error),

    #[error("Camera unavailable: {details}")]
    DeviceUnavailable { details: String },

    #[error("Storage unavailable at {location}: {details}")]
    StorageUnavailable { location: String, details: String },

    #[error("Failed to save photo: {details}")]
    SaveFailed { details: String },

    #[error("Failed to read photos: {details}")]
    ReadFailed { details: String },

    #[error("Photo {id} not found")]
    NotFound { id: i64 },

    #[error("Invalid timestamp range: {details}")]
    InvalidRange { details: String },

    #[error("Export failed: {details}")]
    ExportFailed { details: String },

    #[error("Failed to fetch asset {path}: {details}")]
    AssetFetchFailed { path: String, details: String },

    #[error("Image encoding error: {details}")]
    Encoding { details: String },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl PhotoDbError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn device_unavailable<S: Into<String>>(details: S) -> Self {
        Self::DeviceUnavailable {
            details: details.into(),
        }
    }

    pub fn save_failed<S: Into<String>>(details: S) -> Self {
        Self::SaveFailed {
            details: details.into(),
        }
    }

    pub fn read_failed<S: Into<String>>(details: S) -> Self {
        Self::ReadFailed {
            details: details.into(),
        }
    }

    pub fn export_failed<S: Into<String>>(details: S) -> Self {
        Self::ExportFailed {
            details: details.into(),
        }
    }

    pub fn encoding<S: Into<String>>(details: S) -> Self {
        Self::Encoding {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PhotoDbError>;

impl From<rusqlite::Error> for PhotoDbError {
    fn from(e: rusqlite::Error) -> Self {
        PhotoDbError::read_failed(e.to_string())
    }
}
