//! Feed HTTP Client

use crate::{parse_feed, FeedError};
use alert_model::Alert;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::error;

/// Feed endpoint configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed endpoint URL
    pub url: String,
    /// Identifying User-Agent header required by the upstream service
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://www.dwd.de/DWD/warnungen/warnapp/json/warnings.json".to_string(),
            user_agent: concat!("weather-alert-importer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the warning feed
pub struct FeedClient {
    config: FeedConfig,
    http: reqwest::Client,
}

impl FeedClient {
    /// Create a new feed client with the given endpoint configuration
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FeedError::ClientSetup(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Download the latest feed document and transform it into alert records.
    ///
    /// Transport failures, non-success statuses, and a malformed top level
    /// are logged and yield `(now, empty list)` so the next cycle retries
    /// cleanly. Only a malformed individual entry escapes as an error.
    pub async fn fetch_current(&self) -> Result<(DateTime<Utc>, Vec<Alert>), FeedError> {
        let response = match self.http.get(&self.config.url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Error fetching latest alerts: {}", e);
                return Ok((Utc::now(), Vec::new()));
            }
        };

        if !response.status().is_success() {
            error!("Error fetching latest alerts: status {}", response.status());
            return Ok((Utc::now(), Vec::new()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Error reading feed reply: {}", e);
                return Ok((Utc::now(), Vec::new()));
            }
        };

        match parse_feed(&body) {
            Ok(result) => Ok(result),
            Err(FeedError::MalformedReply(reason)) => {
                error!("Error fetching latest alerts: malformed reply: {}", reason);
                Ok((Utc::now(), Vec::new()))
            }
            Err(e) => Err(e),
        }
    }
}
