// Cycle outcome - tagged result of one fetch/extract/infer pass
use super::prediction::BufferStatus;
use super::sample::TelemetrySample;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Fetch, extraction and inference all completed
    Success {
        sample: TelemetrySample,
        prediction: Option<f64>,
        buffer: BufferStatus,
    },
    /// Recoverable failure, counted as an error
    TransientError(CycleError),
    /// Sensors still warming up; waited out without counting an error
    IncompleteData { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CycleError {
    #[error("HTTP error {0}")]
    HttpStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("data parsing error: {0}")]
    Parse(String),

    /// Failure raised by the predictor rather than by the network or the data
    #[error("unexpected error: {0}")]
    Unexpected(String),
}
