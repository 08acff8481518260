//! Best-effort archive of emitted records.

use crate::emitter::{Sink, SinkKind};
use crate::error::SinkError;
use async_trait::async_trait;
use emulator_types::{to_json_vec, Record, SampleKey, Source};
use posting_emulator_archive::ArchiveStore;
use tracing::debug;

/// Object key for one archived record: `{source}_data/{key}.json`.
pub fn archive_key(source: Source, key: SampleKey) -> String {
    format!("{source}_data/{key}.json")
}

/// Writes each record as a JSON object to an archive store.
pub struct ArchiveSink {
    store: Box<dyn ArchiveStore>,
}

impl ArchiveSink {
    pub fn new(store: Box<dyn ArchiveStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Sink for ArchiveSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Archive
    }

    async fn deliver(
        &self,
        source: Source,
        key: SampleKey,
        record: &Record,
    ) -> Result<(), SinkError> {
        let body = to_json_vec(&record.to_json()?)?;
        let object_key = archive_key(source, key);
        self.store
            .put(&object_key, body)
            .await
            .map_err(SinkError::Archive)?;
        debug!("Archived {} record to {}", source, self.store.location(&object_key));
        Ok(())
    }
}
