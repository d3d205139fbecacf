// ThingSpeak client - fetches the last feed entry of a channel
use crate::application::telemetry_source::{FetchError, TelemetrySource};
use crate::domain::sample::FeedEntry;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ThingSpeakClient {
    client: reqwest::Client,
    url: String,
}

impl ThingSpeakClient {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, url })
    }
}

/// Map a transport error onto the fetch taxonomy
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Parse(err.to_string())
    } else {
        FetchError::Connection(err.to_string())
    }
}

#[async_trait]
impl TelemetrySource for ThingSpeakClient {
    async fn fetch_latest(&self) -> Result<FeedEntry, FetchError> {
        tracing::debug!("Fetching latest feed entry");

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(classify)?;

        // An empty channel answers with the bare literal `-1`, which is valid
        // JSON but not an object and is rejected here.
        serde_json::from_str::<FeedEntry>(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
