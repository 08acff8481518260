//! Kafka REST proxy topic sink.

use crate::emitter::{Sink, SinkKind};
use crate::envelope::TopicEnvelope;
use crate::error::SinkError;
use crate::http::send;
use async_trait::async_trait;
use emulator_types::{to_json_vec, Record, SampleKey, Source};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Content type expected by the REST proxy for JSON-valued records.
pub const KAFKA_JSON_CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

/// Topic id used by the emulation pipeline unless overridden.
pub const DEFAULT_TOPIC_ID: &str = "0affe012670f";

/// Posts each record to `{base_url}/topics/{topic_id}.{source}`.
#[derive(Debug, Clone)]
pub struct TopicSink {
    client: reqwest::Client,
    base_url: String,
    topic_id: String,
}

impl TopicSink {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        topic_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            topic_id: topic_id.into(),
        }
    }

    pub fn topic_url(&self, source: Source) -> String {
        format!("{}/topics/{}.{}", self.base_url, self.topic_id, source)
    }
}

#[async_trait]
impl Sink for TopicSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Topic
    }

    async fn deliver(
        &self,
        source: Source,
        _key: SampleKey,
        record: &Record,
    ) -> Result<(), SinkError> {
        let payload = to_json_vec(&TopicEnvelope::single(record.to_json()?))?;
        debug!(
            "Topic payload for {}: {}",
            source,
            String::from_utf8_lossy(&payload)
        );

        let request = self
            .client
            .post(self.topic_url(source))
            .header(CONTENT_TYPE, KAFKA_JSON_CONTENT_TYPE);
        send(request, &format!("topic {}", source), payload).await
    }
}
