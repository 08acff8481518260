//! Command-line configuration and construction of the pipeline components.
//!
//! Configuration is resolved once at startup into plain values and passed
//! explicitly to the components; nothing is held in globals.

pub mod credentials;
pub mod duration;

pub use credentials::DatabaseCredentials;
pub use duration::parse_duration;

use crate::sampler::{Sampler, DEFAULT_TABLE_SIZE};
use anyhow::Context;
use clap::Args;
use posting_emulator_archive::ArchiveTarget;
use posting_emulator_mysql_source::{MySqlRowFetcher, SourceTables};
use posting_emulator_sink::stream::DEFAULT_PARTITION_KEY;
use posting_emulator_sink::topic::DEFAULT_TOPIC_ID;
use posting_emulator_sink::{
    build_client, ArchiveSink, Emitter, HttpOptions, PartitionKey, StreamMode, StreamSink,
    TopicSink,
};
use std::path::PathBuf;
use std::time::Duration;

/// Where rows are read from.
#[derive(Args, Clone, Debug)]
pub struct SourceOpts {
    /// Path to the YAML credentials file (HOST, PORT, USER, PASSWORD, DATABASE)
    #[arg(long, default_value = "db_creds.yaml", env = "EMULATOR_DB_CREDS")]
    pub db_creds: PathBuf,

    /// Table holding post data
    #[arg(long, default_value = "pinterest_data")]
    pub pin_table: String,

    /// Table holding geolocation data
    #[arg(long, default_value = "geolocation_data")]
    pub geo_table: String,

    /// Table holding user data
    #[arg(long, default_value = "user_data")]
    pub user_table: String,

    /// Timeout for connecting to the database (e.g. "10s")
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub db_timeout: Duration,
}

impl SourceOpts {
    /// Load credentials and build the MySQL fetcher.
    pub fn build_fetcher(&self) -> anyhow::Result<MySqlRowFetcher> {
        let creds = DatabaseCredentials::from_file(&self.db_creds)?;
        let tables = SourceTables::new(&self.pin_table, &self.geo_table, &self.user_table)?;
        let url = creds.connection_url("mysql")?;
        let fetcher = MySqlRowFetcher::new(&url, tables)
            .context("Failed to configure MySQL source")?
            .with_connect_timeout(self.db_timeout);
        Ok(fetcher)
    }
}

/// How row offsets and think-time delays are chosen.
#[derive(Args, Clone, Debug)]
pub struct SamplerOpts {
    /// Upper bound (exclusive) for sampled row offsets
    #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
    pub table_size: u64,

    /// Upper bound (exclusive) for the random delay before each fetch (e.g. "2s", "500ms")
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub max_delay: Duration,

    /// Random seed for a reproducible sequence of offsets and delays
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SamplerOpts {
    pub fn build_sampler(&self) -> Sampler {
        match self.seed {
            Some(seed) => Sampler::seeded(self.table_size, self.max_delay, seed),
            None => Sampler::new(self.table_size, self.max_delay),
        }
    }
}

/// Where records are sent.
#[derive(Args, Clone, Debug)]
pub struct SinkOpts {
    /// Base URL of the REST proxy fronting the topics (enables the topic sink)
    #[arg(long, env = "EMULATOR_TOPIC_BASE_URL")]
    pub topic_base_url: Option<String>,

    /// Topic id; records go to `{topic_id}.pin`, `{topic_id}.geo`, `{topic_id}.user`
    #[arg(long, default_value = DEFAULT_TOPIC_ID, env = "EMULATOR_TOPIC_ID")]
    pub topic_id: String,

    /// Base URL of the streaming API (enables the stream sink)
    #[arg(long, env = "EMULATOR_STREAM_BASE_URL")]
    pub stream_base_url: Option<String>,

    /// Stream name prefix; defaults to `streaming-{topic_id}`
    #[arg(long)]
    pub stream_prefix: Option<String>,

    /// Stream endpoint shape: "record" (one record per call) or "batch"
    #[arg(long, default_value = "record")]
    pub stream_mode: StreamMode,

    /// Partition key sent with stream records
    #[arg(long, default_value = DEFAULT_PARTITION_KEY)]
    pub partition_key: String,

    /// Rotate partition keys over `{partition_key}-1..={n}` instead of a fixed key
    #[arg(long, value_name = "N")]
    pub partition_rotation: Option<u32>,

    /// Timeout for each sink call, archive writes included (e.g. "30s")
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub http_timeout: Duration,

    /// Archive target: `s3://bucket/prefix/` or a local directory
    #[arg(long)]
    pub archive: Option<String>,
}

impl SinkOpts {
    pub fn stream_prefix(&self) -> String {
        self.stream_prefix
            .clone()
            .unwrap_or_else(|| format!("streaming-{}", self.topic_id))
    }

    pub fn partition_key(&self) -> PartitionKey {
        match self.partition_rotation {
            Some(count) => PartitionKey::Rotating {
                prefix: self.partition_key.clone(),
                count,
            },
            None => PartitionKey::Fixed(self.partition_key.clone()),
        }
    }

    /// Build the emitter with every configured sink.
    pub async fn build_emitter(&self) -> anyhow::Result<Emitter> {
        let options = HttpOptions::default().with_timeout(self.http_timeout);
        let client = build_client(&options).context("Failed to build HTTP client")?;
        let mut emitter = Emitter::new();

        if let Some(base_url) = &self.topic_base_url {
            tracing::info!("Topic sink: {}/topics/{}.*", base_url, self.topic_id);
            emitter = emitter.with_sink(Box::new(TopicSink::new(
                client.clone(),
                base_url.clone(),
                self.topic_id.clone(),
            )));
        }

        if let Some(base_url) = &self.stream_base_url {
            tracing::info!(
                "Stream sink: {}/streams/{}-* ({:?})",
                base_url,
                self.stream_prefix(),
                self.stream_mode
            );
            let sink = StreamSink::new(client, base_url.clone(), self.stream_prefix())
                .with_mode(self.stream_mode)
                .with_partition_key(self.partition_key());
            emitter = emitter.with_sink(Box::new(sink));
        }

        if let Some(archive) = &self.archive {
            let target = ArchiveTarget::parse(archive)?;
            tracing::info!("Archive sink: {}", target.display_name());
            let store = target
                .open(self.http_timeout)
                .await
                .with_context(|| format!("Failed to open archive {}", target.display_name()))?;
            emitter = emitter.with_archive(ArchiveSink::new(store));
        }

        if emitter.sink_count() == 0 && !emitter.has_archive() {
            tracing::warn!("No sinks configured; fetched records will only be logged");
        }
        Ok(emitter)
    }
}
