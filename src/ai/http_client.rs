//! HTTP transport
//!
//! The proxy client talks to the network only through `Transport`, so tests
//! can script responses and latency. `ReqwestTransport` is the real one.
//!
//! Timeouts are not configured on the reqwest client: the proxy client owns
//! the deadline and drops the request future when it expires.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Raw HTTP response: status plus body text
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body; transport-level failures are `Err(message)`
    async fn post_json(&self, url: &str, body: &serde_json::Value)
        -> Result<TransportResponse, String>;

    /// GET raw bytes (image downloads)
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Transport over a pooled reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Client tuned for long-running generation calls:
    /// - pooled idle connections for TLS session reuse
    /// - TCP keepalive across cold starts
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, String> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;

        Ok(TransportResponse { status, body })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Download failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Download failed ({})", status));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| format!("Failed to read download: {}", e))
    }
}
