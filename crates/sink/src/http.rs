//! Shared HTTP client settings and the send/check step used by both HTTP sinks.

use crate::error::SinkError;
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

/// Default end-to-end timeout for one sink call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing the TCP/TLS connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts applied to every sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl HttpOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        // Connect timeout never exceeds the call timeout.
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }
}

/// Build a client that enforces the configured timeouts.
pub fn build_client(options: &HttpOptions) -> Result<reqwest::Client, SinkError> {
    Ok(reqwest::Client::builder()
        .timeout(options.timeout)
        .connect_timeout(options.connect_timeout)
        .build()?)
}

/// Send `body` and treat anything but 200 as a failed delivery.
pub(crate) async fn send(
    request: RequestBuilder,
    label: &str,
    body: Vec<u8>,
) -> Result<(), SinkError> {
    let response = request.body(body).send().await?;
    let status = response.status();
    info!("Posted to {} with response: {}", label, status.as_u16());

    if status != StatusCode::OK {
        let text = response.text().await.unwrap_or_default();
        warn!("Error posting to {}: {}", label, text);
        return Err(SinkError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(())
}
