//! Error types for row fetching.

use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a fetch. All of them are fatal to the current
/// iteration; the fetcher never retries.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The data source could not be reached or rejected the credentials.
    #[error("Source unavailable at {target}: {source}")]
    SourceUnavailable {
        target: String,
        #[source]
        source: BoxError,
    },

    /// Connecting took longer than the configured timeout.
    #[error("Timed out after {timeout:?} connecting to {target}")]
    Timeout { target: String, timeout: Duration },

    /// The positional query itself failed (missing table, lost connection).
    #[error("Query on table '{table}' failed: {source}")]
    Query {
        table: String,
        #[source]
        source: BoxError,
    },

    /// Connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    /// Table name is not a plain identifier.
    #[error("Invalid table name '{0}'")]
    InvalidTable(String),
}

impl FetchError {
    pub fn unavailable(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        FetchError::SourceUnavailable {
            target: target.into(),
            source: source.into(),
        }
    }
}
