use super::cursor::{CursorKey, CursorQuery, RecordCursor};
use super::models::{
    format_timestamp, parse_timestamp, NewPhoto, PhotoImage, PhotoRecord, StorageEstimate,
    TimestampRange,
};
use crate::config::StorageConfig;
use crate::error::{PhotoDbError, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SCHEMA_VERSION: i64 = 1;
const RECORD_COLUMNS: &str = "id, timestamp, description, mime_type, image";
const IN_MEMORY: &str = ":memory:";

/// Handle to the photo database
///
/// Clones share one connection. Every statement runs on the blocking pool and
/// the connection mutex serializes them, so each call is its own transaction.
#[derive(Clone)]
pub struct PhotoStore {
    conn: Arc<Mutex<Option<Connection>>>,
    location: String,
    path: Option<PathBuf>,
    batch_size: usize,
}

impl PhotoStore {
    /// Open or create the database described by the configuration
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        if config.path == IN_MEMORY {
            return Self::open_in_memory_with_batch(config.cursor_batch_size).await;
        }

        let path = PathBuf::from(&config.path);
        let location = path.display().to_string();
        info!("Opening photo store at {}", location);

        let open_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> std::result::Result<Connection, String> {
            if let Some(parent) = open_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
            let conn = Connection::open(&open_path).map_err(|e| e.to_string())?;
            migrate(&conn).map_err(|e| format!("Schema migration failed: {}", e))?;
            Ok(conn)
        })
        .await
        .map_err(|e| PhotoDbError::system(format!("Storage open task failed: {}", e)))?
        .map_err(|details| {
            error!("Failed to open photo store at {}: {}", location, details);
            PhotoDbError::StorageUnavailable {
                location: location.clone(),
                details,
            }
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            location,
            path: Some(path),
            batch_size: config.cursor_batch_size.max(1),
        })
    }

    /// Open a private in-memory database with the same schema
    pub async fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_batch(64).await
    }

    async fn open_in_memory_with_batch(batch_size: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .and_then(|conn| migrate(&conn).map(|_| conn))
            .map_err(|e| PhotoDbError::StorageUnavailable {
                location: IN_MEMORY.to_string(),
                details: e.to_string(),
            })?;

        debug!("Opened in-memory photo store");

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            location: IN_MEMORY.to_string(),
            path: None,
            batch_size: batch_size.max(1),
        })
    }

    /// Where the store lives (file path or `:memory:`)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Use a different cursor page size for cursors created from this handle
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let location = self.location.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            let conn = guard.as_mut().ok_or_else(|| PhotoDbError::StorageUnavailable {
                location,
                details: "store is closed".to_string(),
            })?;
            f(conn)
        })
        .await
        .map_err(|e| PhotoDbError::system(format!("Storage task failed: {}", e)))?
    }

    /// Insert a photo and return the id the store assigned to it.
    ///
    /// The timestamp is stored in the fixed-width UTC form so range queries can
    /// compare it as text.
    pub async fn add(&self, mut photo: NewPhoto) -> Result<i64> {
        let timestamp = parse_timestamp(&photo.timestamp)
            .map_err(|e| PhotoDbError::save_failed(e.to_string()))?;
        photo.timestamp = format_timestamp(timestamp);

        if photo.image.is_empty() {
            return Err(PhotoDbError::save_failed("image data is empty"));
        }
        if photo.image.mime_type.trim().is_empty() {
            return Err(PhotoDbError::save_failed("image MIME type is empty"));
        }

        let size = photo.image.len();
        let id = self
            .run(move |conn| {
                insert_photo(conn, &photo).map_err(|e| PhotoDbError::save_failed(e.to_string()))
            })
            .await?;

        debug!("Stored photo {} ({} bytes)", id, size);
        Ok(id)
    }

    /// Fetch a single photo by id
    pub async fn get(&self, id: i64) -> Result<PhotoRecord> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM photos WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(|e| PhotoDbError::read_failed(e.to_string()))?
            .ok_or(PhotoDbError::NotFound { id })
        })
        .await
    }

    /// Photos with `lower <= timestamp <= upper`, oldest first
    pub fn query_range(&self, range: TimestampRange) -> RecordCursor {
        RecordCursor::new(self.clone(), CursorQuery::Range(range), self.batch_size)
    }

    /// Every photo in insertion order
    pub fn iterate_all(&self) -> RecordCursor {
        RecordCursor::new(self.clone(), CursorQuery::All, self.batch_size)
    }

    /// Photos whose description matches exactly, in insertion order
    pub fn query_description<S: Into<String>>(&self, description: S) -> RecordCursor {
        RecordCursor::new(
            self.clone(),
            CursorQuery::Description(description.into()),
            self.batch_size,
        )
    }

    /// Load the page of records following `after`
    pub(crate) async fn fetch_page(
        &self,
        query: CursorQuery,
        after: Option<CursorKey>,
        limit: usize,
    ) -> Result<Vec<PhotoRecord>> {
        self.run(move |conn| {
            let limit = limit as i64;
            let after_id = after.as_ref().map(|k| k.id).unwrap_or(i64::MIN);

            let rows = match &query {
                CursorQuery::All => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT {} FROM photos WHERE id > ?1 ORDER BY id LIMIT ?2",
                        RECORD_COLUMNS
                    ))?;
                    let rows = stmt
                        .query_map(params![after_id, limit], row_to_record)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                CursorQuery::Description(description) => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT {} FROM photos WHERE description = ?1 AND id > ?2 ORDER BY id LIMIT ?3",
                        RECORD_COLUMNS
                    ))?;
                    let rows = stmt
                        .query_map(params![description, after_id, limit], row_to_record)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                CursorQuery::Range(range) => {
                    let after_timestamp = after
                        .as_ref()
                        .map(|k| k.timestamp.clone())
                        .unwrap_or_else(|| range.lower().to_string());
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT {} FROM photos \
                         WHERE timestamp >= ?1 AND timestamp <= ?2 \
                           AND (timestamp > ?3 OR (timestamp = ?3 AND id > ?4)) \
                         ORDER BY timestamp, id LIMIT ?5",
                        RECORD_COLUMNS
                    ))?;
                    let rows = stmt
                        .query_map(
                            params![range.lower(), range.upper(), after_timestamp, after_id, limit],
                            row_to_record,
                        )?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };

            Ok(rows)
        })
        .await
    }

    /// Number of stored photos
    pub async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get::<_, i64>(0))
                .map(|count| count as u64)
                .map_err(|e| PhotoDbError::read_failed(e.to_string()))
        })
        .await
    }

    /// Database size on disk and free space on its filesystem
    pub async fn estimate(&self) -> Result<StorageEstimate> {
        let Some(path) = self.path.clone() else {
            return Ok(StorageEstimate {
                usage_bytes: 0,
                available_bytes: 0,
            });
        };

        tokio::task::spawn_blocking(move || -> Result<StorageEstimate> {
            let usage_bytes = database_files(&path)
                .iter()
                .filter_map(|p| std::fs::metadata(p).ok())
                .map(|m| m.len())
                .sum();

            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let available_bytes = fs2::available_space(dir)?;

            Ok(StorageEstimate {
                usage_bytes,
                available_bytes,
            })
        })
        .await
        .map_err(|e| PhotoDbError::system(format!("Storage estimate task failed: {}", e)))?
    }

    /// Close the connection; every handle sharing it stops working
    pub async fn close(self) -> Result<()> {
        let conn = self.conn.lock().take();

        match conn {
            Some(conn) => {
                let location = self.location.clone();
                tokio::task::spawn_blocking(move || conn.close())
                    .await
                    .map_err(|e| PhotoDbError::system(format!("Storage close task failed: {}", e)))?
                    .map_err(|(_, e)| PhotoDbError::StorageUnavailable {
                        location,
                        details: format!("Failed to close: {}", e),
                    })?;
                info!("Closed photo store at {}", self.location);
            }
            None => warn!("Photo store at {} was already closed", self.location),
        }

        Ok(())
    }
}

/// Create the schema if it does not exist yet; safe to run on every open
fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS photos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            description TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            image BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_photos_timestamp ON photos(timestamp);
        CREATE INDEX IF NOT EXISTS idx_photos_description ON photos(description);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )?;

    Ok(())
}

fn insert_photo(conn: &mut Connection, photo: &NewPhoto) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO photos (timestamp, description, mime_type, image) VALUES (?1, ?2, ?3, ?4)",
        params![
            photo.timestamp,
            photo.description,
            photo.image.mime_type,
            photo.image.bytes,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    Ok(PhotoRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        description: row.get(2)?,
        image: PhotoImage {
            mime_type: row.get(3)?,
            bytes: row.get(4)?,
        },
    })
}

/// The database file plus SQLite's journal side files
fn database_files(path: &Path) -> Vec<PathBuf> {
    let base = path.as_os_str().to_string_lossy().to_string();
    vec![
        path.to_path_buf(),
        PathBuf::from(format!("{}-journal", base)),
        PathBuf::from(format!("{}-wal", base)),
    ]
}
