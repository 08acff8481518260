//! In-memory row fetcher.

use crate::error::FetchError;
use crate::fetcher::RowFetcher;
use async_trait::async_trait;
use emulator_types::{Record, SampleKey, Source, SourceRecords};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves rows from in-memory tables with the same positional semantics as
/// the MySQL fetcher: the row at index K, or an empty record past the end.
#[derive(Debug, Default)]
pub struct MemoryRowFetcher {
    tables: HashMap<Source, Vec<Record>>,
    unavailable: Option<String>,
    fetches: AtomicUsize,
}

impl MemoryRowFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose every fetch fails with `SourceUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Replace the rows of one source table.
    pub fn with_rows(mut self, source: Source, rows: Vec<Record>) -> Self {
        self.tables.insert(source, rows);
        self
    }

    /// Row at ordinal position `key`, or an empty record.
    pub fn nth_row(&self, source: Source, key: SampleKey) -> Record {
        usize::try_from(key.get())
            .ok()
            .and_then(|i| self.tables.get(&source)?.get(i))
            .cloned()
            .unwrap_or_default()
    }

    pub fn table_len(&self, source: Source) -> usize {
        self.tables.get(&source).map_or(0, Vec::len)
    }

    /// Number of fetch calls made so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RowFetcher for MemoryRowFetcher {
    async fn fetch(&self, key: SampleKey) -> Result<SourceRecords, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = &self.unavailable {
            return Err(FetchError::unavailable("memory", reason.clone()));
        }
        Ok(SourceRecords::new(
            self.nth_row(Source::Pin, key),
            self.nth_row(Source::Geo, key),
            self.nth_row(Source::User, key),
        ))
    }
}
