//! HTTP transport (reqwest)
//!
//! Carries the poll retry policy: the processor only ever sees the final
//! `(status, body)` of a cycle, never individual attempts.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;
use webrelay_shared::limits;

use super::traits::{HttpFetch, HttpPost};

/// reqwest-backed fetch/post client
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(limits::FETCH_TIMEOUT_MS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for HttpClient {
    async fn get(&self, url: &str) -> Result<(u16, String)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Ok((status, body));
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "HTTP GET failed");
                    if attempt >= limits::FETCH_MAX_ATTEMPTS {
                        return Err(e).context("HTTP GET failed after retries");
                    }
                    tokio::time::sleep(Duration::from_millis(limits::FETCH_RETRY_DELAY_MS)).await;
                }
            }
        }
    }
}

#[async_trait]
impl HttpPost for HttpClient {
    async fn post_json(&self, url: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .context("POST failed")?;

        if !response.status().is_success() {
            warn!(url, status = response.status().as_u16(), "POST not accepted");
        }
        Ok(())
    }
}
