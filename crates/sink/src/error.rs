//! Error types for sink delivery.

use emulator_types::SerializationError;
use thiserror::Error;

/// A failed delivery to one sink for one source.
///
/// Every variant is scoped to a single call; none of them stop sibling
/// deliveries in the same iteration.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The endpoint answered with something other than 200.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection failure, timeout, or other transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The record holds a value with no JSON representation.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Writing to the archive failed.
    #[error("Archive error: {0:#}")]
    Archive(anyhow::Error),
}

impl SinkError {
    /// HTTP status of the failed call, when the endpoint answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::Status { status, .. } => Some(*status),
            SinkError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
