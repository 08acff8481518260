//! Per-sink wrappers placed around an encoded record.

use serde::Serialize;

/// Kafka REST proxy body: `{"records":[{"value": <record>}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct TopicEnvelope {
    pub records: Vec<TopicValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicValue {
    pub value: serde_json::Value,
}

impl TopicEnvelope {
    pub fn single(record: serde_json::Value) -> Self {
        Self {
            records: vec![TopicValue { value: record }],
        }
    }
}

/// Single-record stream body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamEnvelope {
    pub stream_name: String,
    pub data: serde_json::Value,
    pub partition_key: String,
}

/// Batch stream body: `Data` is a list of `{"Data": <record>}` entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamBatchEnvelope {
    pub stream_name: String,
    pub data: Vec<StreamBatchEntry>,
    pub partition_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamBatchEntry {
    pub data: serde_json::Value,
}
