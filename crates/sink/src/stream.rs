//! Streaming-record sink.

use crate::emitter::{Sink, SinkKind};
use crate::envelope::{StreamBatchEntry, StreamBatchEnvelope, StreamEnvelope};
use crate::error::SinkError;
use crate::http::send;
use async_trait::async_trait;
use emulator_types::{to_json_vec, Record, SampleKey, Source};
use reqwest::header::CONTENT_TYPE;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Partition key used unless configured otherwise.
pub const DEFAULT_PARTITION_KEY: &str = "partition-1";

/// Which stream endpoint shape to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// `PUT .../record` with the record as `Data`.
    #[default]
    Record,
    /// `PUT .../records` with `Data: [{"Data": record}]`.
    Batch,
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(StreamMode::Record),
            "batch" => Ok(StreamMode::Batch),
            other => Err(format!("unknown stream mode '{other}' (expected record or batch)")),
        }
    }
}

/// How the partition key is chosen for each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionKey {
    Fixed(String),
    /// Round-robin over `{prefix}-1 ..= {prefix}-{count}`.
    Rotating { prefix: String, count: u32 },
}

impl Default for PartitionKey {
    fn default() -> Self {
        PartitionKey::Fixed(DEFAULT_PARTITION_KEY.to_string())
    }
}

/// Puts each record to `{base_url}/streams/{stream_prefix}-{source}/record[s]`.
#[derive(Debug)]
pub struct StreamSink {
    client: reqwest::Client,
    base_url: String,
    stream_prefix: String,
    mode: StreamMode,
    partition_key: PartitionKey,
    calls: AtomicU64,
}

impl StreamSink {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        stream_prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stream_prefix: stream_prefix.into(),
            mode: StreamMode::default(),
            partition_key: PartitionKey::default(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_partition_key(mut self, partition_key: PartitionKey) -> Self {
        self.partition_key = partition_key;
        self
    }

    pub fn stream_name(&self, source: Source) -> String {
        format!("{}-{}", self.stream_prefix, source)
    }

    pub fn stream_url(&self, source: Source) -> String {
        let suffix = match self.mode {
            StreamMode::Record => "record",
            StreamMode::Batch => "records",
        };
        format!(
            "{}/streams/{}/{}",
            self.base_url,
            self.stream_name(source),
            suffix
        )
    }

    fn next_partition_key(&self) -> String {
        match &self.partition_key {
            PartitionKey::Fixed(key) => key.clone(),
            PartitionKey::Rotating { prefix, count } => {
                let n = self.calls.fetch_add(1, Ordering::Relaxed) % u64::from((*count).max(1));
                format!("{}-{}", prefix, n + 1)
            }
        }
    }

    fn payload(&self, source: Source, record: &Record) -> Result<Vec<u8>, SinkError> {
        let data = record.to_json()?;
        let stream_name = self.stream_name(source);
        let partition_key = self.next_partition_key();
        let payload = match self.mode {
            StreamMode::Record => to_json_vec(&StreamEnvelope {
                stream_name,
                data,
                partition_key,
            })?,
            StreamMode::Batch => to_json_vec(&StreamBatchEnvelope {
                stream_name,
                data: vec![StreamBatchEntry { data }],
                partition_key,
            })?,
        };
        Ok(payload)
    }
}

#[async_trait]
impl Sink for StreamSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Stream
    }

    async fn deliver(
        &self,
        source: Source,
        _key: SampleKey,
        record: &Record,
    ) -> Result<(), SinkError> {
        let payload = self.payload(source, record)?;
        debug!(
            "Stream payload for {}: {}",
            source,
            String::from_utf8_lossy(&payload)
        );

        let request = self
            .client
            .put(self.stream_url(source))
            .header(CONTENT_TYPE, "application/json");
        send(request, &format!("stream {}", self.stream_name(source)), payload).await
    }
}
