pub mod app;
pub mod cache;
pub mod camera;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod record;
pub mod storage;

pub use app::{AppStats, PhotoDbApp};
pub use cache::{AssetFetcher, CachedResponse, DirFetcher, OfflineCacheWorker, WorkerState};
pub use camera::{CameraInterface, CameraInterfaceBuilder, Canvas, LiveStream};
pub use config::PhotoDbConfig;
pub use error::{PhotoDbError, Result};
pub use export::{ExportService, ExportedRecord, EXPORT_FILENAME};
pub use frame::{FrameData, FrameFormat};
pub use record::RecordService;
pub use storage::{PhotoImage, PhotoRecord, PhotoStore, RecordCursor, TimestampRange};

#[cfg(feature = "offline_cache")]
pub use cache::{CacheServer, HttpFetcher};
