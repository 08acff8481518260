//! Posting Emulator Library
//!
//! Emulates a stream of user activity by repeatedly sampling one row from
//! each of three tables (post, geolocation and user data) and forwarding the
//! rows to downstream ingestion endpoints.
//!
//! # Pipeline
//!
//! Every iteration runs the same fixed pipeline to completion before the next
//! one starts:
//!
//! 1. [`Sampler`] picks a row offset and a think-time delay
//! 2. a [`RowFetcher`] reads the row at that offset from each table
//! 3. an [`Emitter`] sends each record to every sink, tolerating failures
//!
//! # CLI Usage
//!
//! ```bash
//! # One iteration against the topic endpoint
//! posting-emulator once --db-creds db_creds.yaml \
//!   --topic-base-url https://example.execute-api.us-east-1.amazonaws.com/prod
//!
//! # Continuous emission to the streaming endpoint, archiving to S3
//! posting-emulator run --db-creds db_creds.yaml \
//!   --stream-base-url https://example.execute-api.us-east-1.amazonaws.com/prods \
//!   --archive s3://emulation-archive/
//! ```

pub mod config;
pub mod emulator;
pub mod sampler;

pub use config::{DatabaseCredentials, SamplerOpts, SinkOpts, SourceOpts};
pub use emulator::{
    forward_interrupts, setup_shutdown_handler, EmulationStats, Emulator, LoopMode,
};
pub use emulator_types::{Record, SampleKey, Source, SourceRecords, Value};
pub use posting_emulator_mysql_source::{
    FetchError, MemoryRowFetcher, MySqlRowFetcher, RowFetcher,
};
pub use posting_emulator_sink::{EmitReport, Emitter};
pub use sampler::{Sample, Sampler};
