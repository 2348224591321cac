//! HTTP transport abstraction for the headline waterfall
//!
//! The waterfall driver only needs "give me the body at this URL or tell me
//! it failed". Putting that behind a trait lets tests script responses and
//! count requests without any network access.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Per-request timeout applied by the production transport
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors a transport can report for a single request
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server responded with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Fetches response bodies for the waterfall driver.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the body at `url`.
    ///
    /// Errors on transport failure or any non-2xx status; the caller treats
    /// both identically as a route failure.
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Creates a transport with the default per-request timeout.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Creates a transport around a custom reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            // Some public relays reject requests without this header.
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
