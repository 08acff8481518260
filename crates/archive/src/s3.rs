//! S3 archive

use crate::ArchiveStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;

/// Writes archived objects to an S3 bucket under a key prefix.
///
/// One client is built at startup and shared by every put.
pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3Archive {
    /// Create a new S3 archive from the default AWS config chain. Every
    /// operation, retries included, is bounded by `timeout`.
    pub async fn new(bucket: String, prefix: String, timeout: Duration) -> Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeout_config(timeout))
            .load()
            .await;
        let client = aws_sdk_s3::Client::new(&sdk_config);
        Ok(Self::with_client(client, bucket, prefix))
    }

    /// Use an already configured client
    pub fn with_client(client: aws_sdk_s3::Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    /// Full object key for an archive key
    pub fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Operation and per-attempt timeouts for the S3 client.
pub fn timeout_config(timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .operation_timeout(timeout)
        .operation_attempt_timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

#[async_trait]
impl ArchiveStore for S3Archive {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let object_key = self.object_key(key);
        let len = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
            .with_context(|| {
                format!(
                    "Failed to put object to S3: s3://{}/{}",
                    self.bucket, object_key
                )
            })?;

        tracing::debug!(
            "Archived {} bytes to s3://{}/{}",
            len,
            self.bucket,
            object_key
        );
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.object_key(key))
    }
}
