//! HTTP client for the upstream catalog API with rate limiting and retry logic.

use super::rate_limiter::RateLimiter;
use crate::error::{FetcherError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::config::CatalogApiConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

/// The only network I/O boundary of the pipeline.
///
/// Every attempt, retries included, waits on the shared [`RateLimiter`].
/// Transport failures and 5xx responses are retried with exponential
/// backoff; HTTP 429 is retried up to the same bound and then surfaces as
/// an `API_RATE_LIMIT` error. HTTP 404 is returned to the caller untouched.
pub struct FetchClient {
    /// HTTP client
    client: Client,
    /// Base URL for the API, without trailing slash
    base_url: String,
    /// Rate limiter shared by every caller of this client
    rate_limiter: Mutex<RateLimiter>,
    /// Maximum retries for failed requests
    max_retries: u32,
    /// Base delay for retry (exponential backoff)
    retry_delay_ms: u64,
}

impl FetchClient {
    /// Create a new client from the `catalog_api` config section
    pub fn new(config: &CatalogApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetcherError::network("Failed to create HTTP client").with_cause(e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Mutex::new(RateLimiter::new(
                config.rate_limit.requests_per_second,
                config.rate_limit.requests_per_minute,
            )),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/anime/1`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }

    /// GET `url`, retrying transient failures.
    ///
    /// Returns the response for any 2xx or 404 status. Fails with
    /// `API_RATE_LIMIT` when 429 persists past the retry bound and with
    /// `NETWORK_ERROR` for everything else.
    pub async fn fetch_with_retry_and_rate_limit(&self, url: &str) -> Result<Response> {
        for attempt in 0..=self.max_retries {
            // Apply rate limiting before each request
            self.rate_limiter.lock().await.acquire().await;

            debug!(url = %url, attempt = attempt + 1, "Making API request");

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() || status == StatusCode::NOT_FOUND {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt == self.max_retries {
                            warn!(url = %url, attempts = attempt + 1, "Rate limit persisted after retries");
                            return Err(FetcherError::rate_limit(format!(
                                "HTTP 429 from {} after {} attempts",
                                url,
                                attempt + 1
                            )));
                        }
                        let delay = self.backoff(attempt);
                        warn!(
                            url = %url,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited by server, waiting"
                        );
                        sleep(delay).await;
                        continue;
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    if status.is_client_error() {
                        warn!(url = %url, status = %status, "Request rejected");
                        return Err(FetcherError::network(format!(
                            "Request to {} failed with status {}: {}",
                            url, status, error_text
                        )));
                    }

                    warn!(url = %url, status = %status, error = %error_text, "Request failed");

                    if attempt < self.max_retries {
                        let delay = self.backoff(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                        sleep(delay).await;
                        continue;
                    }
                    return Err(FetcherError::network(format!(
                        "Request to {} failed with status {} after {} attempts: {}",
                        url,
                        status,
                        attempt + 1,
                        error_text
                    )));
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Request error");

                    if attempt < self.max_retries {
                        let delay = self.backoff(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                        sleep(delay).await;
                        continue;
                    }
                    return Err(FetcherError::network(format!(
                        "Request to {} failed after {} attempts",
                        url,
                        attempt + 1
                    ))
                    .with_cause(e));
                }
            }
        }

        Err(FetcherError::network(format!("Request to {} failed after all retries", url)))
    }

    /// GET and decode JSON; `Ok(None)` means the upstream has no such resource.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.fetch_with_retry_and_rate_limit(url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(url = %url, "Not found");
            return Ok(None);
        }

        match response.json::<T>().await {
            Ok(data) => {
                debug!(url = %url, "Request successful");
                Ok(Some(data))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to parse response");
                Err(FetcherError::network(format!("Failed to parse response from {}", url)).with_cause(e))
            }
        }
    }

    /// Requests made in the last minute
    pub async fn rate_limit_stats(&self) -> usize {
        self.rate_limiter.lock().await.current_minute_count()
    }
}
