//! Archive targets for emitted records.
//!
//! An archive is a flat object store addressed by string keys such as
//! `pin_data/42.json`. Two targets are supported:
//!
//! - **Local**: a directory; keys become relative file paths
//! - **S3**: a bucket plus an optional key prefix
//!
//! # Example
//!
//! ```ignore
//! use posting_emulator_archive::ArchiveTarget;
//!
//! let target = ArchiveTarget::parse("s3://my-bucket/emulation/")?;
//! let store = target.open(Duration::from_secs(30)).await?;
//! store.put("pin_data/42.json", body).await?;
//! ```

mod local;
mod s3;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

pub use local::LocalArchive;
pub use s3::{timeout_config, S3Archive};

/// Where archived objects are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveTarget {
    /// Local directory
    Local(PathBuf),
    /// S3 bucket and key prefix (possibly empty)
    S3 { bucket: String, prefix: String },
}

impl ArchiveTarget {
    /// Parse a target, auto-detecting the type
    ///
    /// - `s3://bucket` or `s3://bucket/prefix/` -> S3
    /// - Everything else -> Local directory
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.starts_with("s3://") {
            let (bucket, prefix) = parse_s3_uri(uri)?;
            Ok(ArchiveTarget::S3 { bucket, prefix })
        } else if uri.is_empty() {
            anyhow::bail!("Archive target must not be empty");
        } else {
            Ok(ArchiveTarget::Local(PathBuf::from(uri)))
        }
    }

    /// Build the store for this target. `timeout` bounds each remote write.
    pub async fn open(&self, timeout: Duration) -> Result<Box<dyn ArchiveStore>> {
        match self {
            ArchiveTarget::Local(path) => Ok(Box::new(LocalArchive::new(path.clone()))),
            ArchiveTarget::S3 { bucket, prefix } => Ok(Box::new(
                S3Archive::new(bucket.clone(), prefix.clone(), timeout).await?,
            )),
        }
    }

    /// Get a display name for logging
    pub fn display_name(&self) -> String {
        match self {
            ArchiveTarget::Local(path) => path.display().to_string(),
            ArchiveTarget::S3 { bucket, prefix } => format!("s3://{bucket}/{prefix}"),
        }
    }
}

/// A blob store that accepts whole objects by key.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Write `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;

    /// Full location of `key`, for logging
    fn location(&self, key: &str) -> String;
}

/// Parse S3 URI in the format: s3://bucket[/prefix]
///
/// A non-empty prefix always ends with `/`.
pub fn parse_s3_uri(uri: &str) -> Result<(String, String)> {
    let uri = uri
        .strip_prefix("s3://")
        .context("S3 URI must start with 's3://'")?;

    let (bucket, prefix) = uri.split_once('/').unwrap_or((uri, ""));
    if bucket.is_empty() {
        anyhow::bail!("S3 URI must be in format 's3://bucket/prefix/'");
    }

    let prefix = if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    };

    Ok((bucket.to_string(), prefix))
}
