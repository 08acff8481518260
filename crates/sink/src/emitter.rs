//! Fan-out of one iteration's records to every sink.

use crate::archive::ArchiveSink;
use crate::error::SinkError;
use async_trait::async_trait;
use emulator_types::{Record, SampleKey, Source, SourceRecords};
use std::fmt;
use tracing::{error, warn};

/// Kind of downstream destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Topic,
    Stream,
    Archive,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkKind::Topic => "topic",
            SinkKind::Stream => "stream",
            SinkKind::Archive => "archive",
        })
    }
}

/// A destination that accepts one record per call.
#[async_trait]
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Deliver one record. Exactly one downstream call per invocation.
    async fn deliver(
        &self,
        source: Source,
        key: SampleKey,
        record: &Record,
    ) -> Result<(), SinkError>;
}

/// Result of one (source, sink) delivery.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub source: Source,
    pub sink: SinkKind,
    pub result: Result<(), SinkError>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything that happened while emitting one iteration.
#[derive(Debug)]
pub struct EmitReport {
    pub key: SampleKey,
    /// Topic and stream deliveries, in call order.
    pub deliveries: Vec<DeliveryOutcome>,
    /// Archive writes, in call order. Never affects `deliveries`.
    pub archived: Vec<DeliveryOutcome>,
}

impl EmitReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }

    pub fn archive_failures(&self) -> usize {
        self.archived.iter().filter(|o| !o.is_success()).count()
    }

    /// Whether every topic/stream delivery succeeded.
    pub fn all_delivered(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, source: Source, sink: SinkKind) -> Option<&DeliveryOutcome> {
        self.deliveries
            .iter()
            .chain(self.archived.iter())
            .find(|o| o.source == source && o.sink == sink)
    }
}

/// Sends each record of an iteration to every configured sink.
#[derive(Default)]
pub struct Emitter {
    sinks: Vec<Box<dyn Sink>>,
    archive: Option<ArchiveSink>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_archive(mut self, archive: ArchiveSink) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn has_archive(&self) -> bool {
        self.archive.is_some()
    }

    /// Deliver all three records to every sink, then archive them.
    ///
    /// Failures are logged and collected; this never returns early.
    pub async fn emit(&self, key: SampleKey, records: &SourceRecords) -> EmitReport {
        let mut deliveries = Vec::with_capacity(self.sinks.len() * Source::ALL.len());
        for sink in &self.sinks {
            for (source, record) in records.iter() {
                let result = sink.deliver(source, key, record).await;
                if let Err(e) = &result {
                    error!("Failed to deliver {} record to {}: {}", source, sink.kind(), e);
                }
                deliveries.push(DeliveryOutcome {
                    source,
                    sink: sink.kind(),
                    result,
                });
            }
        }

        let mut archived = Vec::new();
        if let Some(archive) = &self.archive {
            for (source, record) in records.iter() {
                let result = archive.deliver(source, key, record).await;
                if let Err(e) = &result {
                    warn!("Failed to archive {} record at {}: {}", source, key, e);
                }
                archived.push(DeliveryOutcome {
                    source,
                    sink: SinkKind::Archive,
                    result,
                });
            }
        }

        EmitReport {
            key,
            deliveries,
            archived,
        }
    }
}
