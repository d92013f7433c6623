use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PhotoDbConfig {
    pub camera: CameraConfig,
    pub canvas: CanvasConfig,
    pub storage: StorageConfig,
    pub record: RecordConfig,
    pub query: QueryConfig,
    pub export: ExportConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Where frames come from
    #[serde(default = "default_camera_source")]
    pub source: CameraSource,

    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// How long to wait for the first live frame before giving up
    #[serde(default = "default_first_frame_timeout_ms")]
    pub first_frame_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    /// Video4Linux device through GStreamer
    V4l2,
    /// Generated test pattern
    Synthetic,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: u32,

    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Rows fetched per cursor round-trip
    #[serde(default = "default_cursor_batch_size")]
    pub cursor_batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RecordConfig {
    /// Description used when a save does not provide one
    #[serde(default = "default_description")]
    pub default_description: String,

    /// Write the most recently displayed photo here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<String>,
}

/// Inclusive timestamp bounds used by the query action when none are given
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_query_lower")]
    pub lower: String,

    #[serde(default = "default_query_upper")]
    pub upper: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    /// Directory the export file is written to
    #[serde(default = "default_export_directory")]
    pub directory: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Name of the asset cache
    #[serde(default = "default_cache_name")]
    pub name: String,

    /// Assets fetched and cached at install time
    #[serde(default = "default_cache_assets")]
    pub assets: Vec<String>,

    /// Upstream origin for network requests (e.g. http://127.0.0.1:8000/)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Local directory standing in for the network when no origin is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<String>,

    /// IP address to bind to
    #[serde(default = "default_cache_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_cache_port")]
    pub port: u16,
}

impl PhotoDbConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("photodb.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.source", "v4l2")?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default(
                "camera.first_frame_timeout_ms",
                default_first_frame_timeout_ms(),
            )?
            .set_default("canvas.width", default_canvas_width())?
            .set_default("canvas.height", default_canvas_height())?
            .set_default("storage.path", default_storage_path())?
            .set_default(
                "storage.cursor_batch_size",
                default_cursor_batch_size() as i64,
            )?
            .set_default("record.default_description", default_description())?
            .set_default("query.lower", default_query_lower())?
            .set_default("query.upper", default_query_upper())?
            .set_default("export.directory", default_export_directory())?
            .set_default("cache.name", default_cache_name())?
            .set_default("cache.assets", default_cache_assets())?
            .set_default("cache.ip", default_cache_ip())?
            .set_default("cache.port", default_cache_port())?
            .add_source(File::with_name(&path_str).required(false))
            // PHOTODB_STORAGE__PATH=... overrides storage.path
            .add_source(Environment::with_prefix("PHOTODB").separator("__"))
            .build()?;

        let config: PhotoDbConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.first_frame_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Camera first_frame_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Message(
                "Canvas dimensions must be greater than 0".to_string(),
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage path must not be empty".to_string(),
            ));
        }

        if self.storage.cursor_batch_size == 0 {
            return Err(ConfigError::Message(
                "Cursor batch size must be greater than 0".to_string(),
            ));
        }

        crate::storage::TimestampRange::parse(&self.query.lower, &self.query.upper)
            .map_err(|e| ConfigError::Message(format!("Invalid default query range: {}", e)))?;

        if self.cache.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "Cache name must not be empty".to_string(),
            ));
        }

        if self.cache.port == 0 {
            return Err(ConfigError::Message(
                "Cache port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for PhotoDbConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                source: default_camera_source(),
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                first_frame_timeout_ms: default_first_frame_timeout_ms(),
            },
            canvas: CanvasConfig {
                width: default_canvas_width(),
                height: default_canvas_height(),
            },
            storage: StorageConfig {
                path: default_storage_path(),
                cursor_batch_size: default_cursor_batch_size(),
            },
            record: RecordConfig {
                default_description: default_description(),
                preview_path: None,
            },
            query: QueryConfig {
                lower: default_query_lower(),
                upper: default_query_upper(),
            },
            export: ExportConfig {
                directory: default_export_directory(),
            },
            cache: CacheConfig {
                name: default_cache_name(),
                assets: default_cache_assets(),
                origin: None,
                asset_dir: None,
                ip: default_cache_ip(),
                port: default_cache_port(),
            },
        }
    }
}

// Default value functions
fn default_camera_source() -> CameraSource {
    CameraSource::V4l2
}
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}
fn default_first_frame_timeout_ms() -> u64 {
    5000
}

fn default_canvas_width() -> u32 {
    640
}
fn default_canvas_height() -> u32 {
    480
}

fn default_storage_path() -> String {
    "./photodb/PhotoDB.sqlite".to_string()
}
fn default_cursor_batch_size() -> usize {
    64
}

fn default_description() -> String {
    "Sample photo description".to_string()
}

fn default_query_lower() -> String {
    "2024-07-18T14:31:56.851Z".to_string()
}
fn default_query_upper() -> String {
    "2024-07-18T14:32:25.274Z".to_string()
}

fn default_export_directory() -> String {
    ".".to_string()
}

fn default_cache_name() -> String {
    "Demo".to_string()
}
fn default_cache_assets() -> Vec<String> {
    vec!["index.html".to_string(), "manifest.json".to_string()]
}
fn default_cache_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_cache_port() -> u16 {
    8081
}
