// Source trait for the latest telemetry feed entry
use crate::domain::outcome::CycleError;
use crate::domain::sample::FeedEntry;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FetchError {
    #[error("HTTP error {0}")]
    HttpStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed response body: {0}")]
    Parse(String),
}

impl From<FetchError> for CycleError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::HttpStatus(status) => CycleError::HttpStatus(status),
            FetchError::Timeout => CycleError::Timeout,
            FetchError::Connection(detail) => CycleError::Connection(detail),
            FetchError::Parse(detail) => CycleError::Parse(detail),
        }
    }
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch the most recent feed entry. Must not sleep or retry.
    async fn fetch_latest(&self) -> Result<FeedEntry, FetchError>;
}
