use super::gateway::PhotoStore;
use super::models::{PhotoRecord, TimestampRange};
use crate::error::Result;
use futures::Stream;
use std::collections::VecDeque;
use tracing::trace;

/// What a cursor walks over
#[derive(Debug, Clone)]
pub(crate) enum CursorQuery {
    All,
    Range(TimestampRange),
    Description(String),
}

/// Position of the last record handed out
#[derive(Debug, Clone)]
pub(crate) struct CursorKey {
    pub(crate) timestamp: String,
    pub(crate) id: i64,
}

/// Lazy, finite walk over stored records.
///
/// Records are loaded a page at a time and the cursor resumes strictly after
/// the last record it returned, so inserts made while iterating are never
/// returned twice. Create a new cursor to start over.
pub struct RecordCursor {
    store: PhotoStore,
    query: CursorQuery,
    batch_size: usize,
    after: Option<CursorKey>,
    buffer: VecDeque<PhotoRecord>,
    exhausted: bool,
    pages_loaded: usize,
}

impl RecordCursor {
    pub(crate) fn new(store: PhotoStore, query: CursorQuery, batch_size: usize) -> Self {
        Self {
            store,
            query,
            batch_size: batch_size.max(1),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
            pages_loaded: 0,
        }
    }

    /// Next record, or `None` once the cursor is exhausted
    pub async fn next(&mut self) -> Result<Option<PhotoRecord>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.load_page().await?;
        }

        let record = self.buffer.pop_front();
        if let Some(record) = &record {
            self.after = Some(CursorKey {
                timestamp: record.timestamp.clone(),
                id: record.id,
            });
        }
        Ok(record)
    }

    async fn load_page(&mut self) -> Result<()> {
        let page = self
            .store
            .fetch_page(self.query.clone(), self.after.clone(), self.batch_size)
            .await?;

        self.pages_loaded += 1;
        trace!(
            "Cursor page {} loaded {} records ({:?})",
            self.pages_loaded,
            page.len(),
            self.query
        );

        if page.len() < self.batch_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }

    /// Number of round-trips to the store so far
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Drain the cursor into a vector
    pub async fn collect(mut self) -> Result<Vec<PhotoRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Adapt the cursor into a `Stream` of records
    pub fn into_stream(mut self) -> impl Stream<Item = Result<PhotoRecord>> {
        async_stream::try_stream! {
            while let Some(record) = self.next().await? {
                yield record;
            }
        }
    }
}
