use crate::error::{PhotoDbError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Encoded image payload together with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoImage {
    pub fn new<S: Into<String>>(mime_type: S, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(crate::camera::PNG_MIME_TYPE, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A stored photo. The id is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: i64,
    pub timestamp: String,
    pub description: String,
    pub image: PhotoImage,
}

/// A photo that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub timestamp: String,
    pub description: String,
    pub image: PhotoImage,
}

impl NewPhoto {
    /// New photo stamped with the current time
    pub fn now<S: Into<String>>(description: S, image: PhotoImage) -> Self {
        Self {
            timestamp: timestamp_now(),
            description: description.into(),
            image,
        }
    }

    /// The record this photo becomes once stored under `id`
    pub fn into_record(self, id: i64) -> PhotoRecord {
        PhotoRecord {
            id,
            timestamp: self.timestamp,
            description: self.description,
            image: self.image,
        }
    }
}

/// Format a time as a fixed-width ISO-8601 UTC string (`2024-07-18T14:31:56.851Z`)
///
/// Every stored timestamp has the same width, so string order is time order.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Parse any RFC 3339 timestamp and normalize it to UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PhotoDbError::InvalidRange {
            details: format!("'{}' is not an ISO-8601 timestamp: {}", value, e),
        })
}

/// Inclusive timestamp bounds for an index range query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRange {
    lower: String,
    upper: String,
}

impl TimestampRange {
    pub fn new(lower: DateTime<Utc>, upper: DateTime<Utc>) -> Result<Self> {
        if lower > upper {
            return Err(PhotoDbError::InvalidRange {
                details: format!(
                    "lower bound {} is after upper bound {}",
                    format_timestamp(lower),
                    format_timestamp(upper)
                ),
            });
        }

        Ok(Self {
            lower: format_timestamp(lower),
            upper: format_timestamp(upper),
        })
    }

    pub fn parse(lower: &str, upper: &str) -> Result<Self> {
        Self::new(parse_timestamp(lower)?, parse_timestamp(upper)?)
    }

    /// Range holding exactly one instant
    pub fn exact(timestamp: &str) -> Result<Self> {
        Self::parse(timestamp, timestamp)
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn upper(&self) -> &str {
        &self.upper
    }

    pub fn contains(&self, timestamp: &str) -> bool {
        self.lower.as_str() <= timestamp && timestamp <= self.upper.as_str()
    }
}

/// Space used by the store and space left on its filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageEstimate {
    pub usage_bytes: u64,
    pub available_bytes: u64,
}
