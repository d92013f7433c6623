//! Local persistent photo store backed by SQLite

mod cursor;
mod gateway;
mod models;

pub use cursor::RecordCursor;
pub use gateway::PhotoStore;
pub use models::{
    format_timestamp, parse_timestamp, timestamp_now, NewPhoto, PhotoImage, PhotoRecord,
    StorageEstimate, TimestampRange,
};
