use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::ArchiveSource;
use crate::error::{Result, StageError};

/// HTTPS fetcher for the remote archive.
///
/// Performs a single GET of the full response body per attempt. The request
/// timeout is explicit rather than whatever the client defaults to, and
/// transient failures (connect errors, timeouts, 5xx responses) are retried
/// a bounded number of times with a linear backoff. 4xx responses fail fast:
/// retrying a 404 will not make the archive appear.
pub struct HttpSource {
    client: Client,
    url: String,
    max_attempts: u32,
}

impl HttpSource {
    /// Create a new HTTP source.
    ///
    /// `timeout` bounds each individual request attempt; `max_attempts` is
    /// the total number of tries before the download is declared failed.
    pub fn new(url: String, timeout: Duration, max_attempts: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("loadstage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StageError::network(url.as_str(), e.to_string()))?;

        Ok(Self {
            client,
            url,
            max_attempts: max_attempts.max(1),
        })
    }

    async fn attempt(&self) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StageError::network(self.url.as_str(), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StageError::HttpStatus {
                url: self.url.clone(),
                status,
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| StageError::network(self.url.as_str(), e.to_string()))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl ArchiveSource for HttpSource {
    async fn fetch(&self, dest: &Path) -> Result<u64> {
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts {
            match self.attempt().await {
                Ok(body) => {
                    if let Some(parent) = dest.parent() {
                        if !parent.as_os_str().is_empty() {
                            tokio::fs::create_dir_all(parent).await?;
                        }
                    }
                    tokio::fs::write(dest, &body).await?;
                    debug!(url = %self.url, bytes = body.len(), "archive downloaded");
                    return Ok(body.len() as u64);
                }
                // Server errors are transient often enough to be worth the wait
                Err(StageError::HttpStatus { status, .. }) if status.is_server_error() => {
                    last_failure = format!("HTTP {status}");
                }
                Err(StageError::Network { reason, .. }) => {
                    last_failure = reason;
                }
                Err(e) => return Err(e),
            }

            if attempt < self.max_attempts {
                warn!(
                    url = %self.url,
                    attempt,
                    max = self.max_attempts,
                    failure = %last_failure,
                    "download attempt failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }
        }

        Err(StageError::network(
            self.url.as_str(),
            format!(
                "{last_failure} (gave up after {} attempts)",
                self.max_attempts
            ),
        ))
    }

    fn origin(&self) -> &str {
        &self.url
    }
}
