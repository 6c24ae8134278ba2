// src/scraping/fetch.rs

use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use reqwest::{Client, header};

use super::ScrapeError;
use crate::{config::ScrapeConfig, error::AppError};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Shared HTTP client for upstream question banks.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    retry_attempts: usize,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Fetches a page body, retrying transient failures with a fixed delay.
    pub async fn get_html(&self, url: &str) -> Result<String, ScrapeError> {
        let backoff = ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(self.retry_attempts);

        (|| async { self.get_once(url).await })
            .retry(&backoff)
            .when(ScrapeError::is_transient)
            .await
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|source| {
                tracing::warn!("Fetch of {} failed: {}", url, source);
                ScrapeError::Request {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Fetch of {} answered {}", url, status);
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| ScrapeError::Request {
            url: url.to_string(),
            source,
        })
    }
}
