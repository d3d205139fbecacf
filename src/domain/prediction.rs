// State-of-charge prediction domain models
use thiserror::Error;

/// Number of samples the predictor needs before it can produce a value
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Result of feeding one sample to the predictor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    /// Not enough history yet; `fill_level` samples buffered so far
    Buffering { fill_level: usize },
    /// State of charge in percent
    Ready { soc_percent: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStatus {
    pub current_size: usize,
    pub target_size: usize,
}

impl BufferStatus {
    pub fn new(current_size: usize, target_size: usize) -> Self {
        Self {
            current_size,
            target_size,
        }
    }

    pub fn is_full(&self) -> bool {
        self.current_size >= self.target_size
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictorError {
    #[error("invalid predictor configuration: {0}")]
    InvalidConfig(String),

    #[error("{quantity} {value} outside accepted range [{min}, {max}]")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("non-finite {0} reading")]
    NonFinite(&'static str),
}
