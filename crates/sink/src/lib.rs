//! Delivery of fetched records to downstream sinks.
//!
//! Each iteration hands the three source records to an [`Emitter`], which
//! sends every record to every configured [`Sink`] and then, optionally, to an
//! archive. Deliveries are independent: a failed call is recorded in the
//! [`EmitReport`] and the remaining calls still run. Nothing is retried here.
//!
//! # Sinks
//!
//! - [`TopicSink`]: `POST {base}/topics/{topic_id}.{source}` with a Kafka REST
//!   proxy body `{"records":[{"value": record}]}`
//! - [`StreamSink`]: `PUT {base}/streams/{name}/record` (or `/records` in batch
//!   mode) with `{"StreamName", "Data", "PartitionKey"}`
//! - [`ArchiveSink`]: one JSON object per record at `{source}_data/{key}.json`

pub mod archive;
pub mod emitter;
pub mod envelope;
pub mod error;
pub mod http;
pub mod stream;
pub mod topic;

pub use archive::{archive_key, ArchiveSink};
pub use emitter::{DeliveryOutcome, EmitReport, Emitter, Sink, SinkKind};
pub use envelope::{StreamBatchEnvelope, StreamBatchEntry, StreamEnvelope, TopicEnvelope};
pub use error::SinkError;
pub use http::{build_client, HttpOptions};
pub use stream::{PartitionKey, StreamMode, StreamSink};
pub use topic::TopicSink;
