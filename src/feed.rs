use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.cbr.ru";

// The upstream answers bare client signatures with 403.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("can't reach the feed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("feed responded with {status}")]
    Upstream { status: StatusCode },
}

/// Somewhere the raw daily feed for a date can be downloaded from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<u8>, FetchError>;
}

/// Client for the central bank `XML_daily.asp` endpoint. Makes exactly one
/// request per call; retries are the caller's business.
pub struct CbrClient {
    client: Client,
    base_url: String,
}

impl CbrClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/scripts/XML_daily.asp?date_req={}",
            self.base_url,
            date.format("%d/%m/%Y")
        )
    }
}

#[async_trait]
impl FeedSource for CbrClient {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<u8>, FetchError> {
        let url = self.get_url(date);
        debug!("Requesting feed from {url}");

        let resp = self.client.get(&url).send().await.map_err(|e| {
            error!("Feed request to {url} failed: {e}");
            FetchError::Network(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Feed request to {url} returned {status}");
            return Err(FetchError::Upstream { status });
        }

        let body = resp.bytes().await.map_err(FetchError::Network)?;
        debug!("Received {} bytes for {date}", body.len());

        Ok(body.to_vec())
    }
}
