//! HTTP download of notarization logs with retry

use crate::error::{Error, Result};
use crate::logs::{LogSource, NotaryLog, parse_log};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Retry schedule for idempotent downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each retry
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Failure of a single attempt
struct AttemptError {
    retryable: bool,
    message: String,
}

impl AttemptError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self {
            retryable: e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            message: e.to_string(),
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Downloads logs with reqwest, retrying transient failures
#[derive(Debug, Clone)]
pub struct LogFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl LogFetcher {
    /// Create a fetcher with a 30 second request timeout and the default retry policy
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::LogFetch(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, RetryPolicy::default()))
    }

    /// Create a fetcher from an existing client
    pub const fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError {
                retryable: is_retryable_status(status),
                message: format!("server responded with {status}"),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| AttemptError::from_reqwest(&e))
    }
}

#[async_trait]
impl LogSource for LogFetcher {
    async fn fetch(&self, url: &str) -> Result<NotaryLog> {
        let parsed =
            Url::parse(url).map_err(|e| Error::LogFetch(format!("invalid log URL {url:?}: {e}")))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&parsed).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "downloaded notarization log");
                    return parse_log(&body);
                }
                Err(e) if e.retryable && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay(attempt);
                    warn!(attempt, ?delay, error = %e.message, "log download failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(Error::LogFetch(format!(
                        "{} (after {attempt} attempt{})",
                        e.message,
                        if attempt == 1 { "" } else { "s" }
                    )));
                }
            }
        }
    }
}
