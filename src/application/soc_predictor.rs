// Predictor trait and the inference step of a cycle
use crate::domain::outcome::CycleError;
use crate::domain::prediction::{BufferStatus, Prediction, PredictorError};
use crate::domain::sample::TelemetrySample;

/// Stateful state-of-charge predictor.
///
/// Every call to `predict` may advance internal history, including calls that
/// return `Prediction::Buffering`.
pub trait SocPredictor: Send {
    fn predict(
        &mut self,
        voltage: f64,
        current: f64,
        temperature: f64,
    ) -> Result<Prediction, PredictorError>;

    fn buffer_status(&self) -> BufferStatus;
}

/// Feed one sample to the predictor and read back its buffer status.
///
/// Predictor failures are not retried; they surface as `CycleError::Unexpected`.
pub fn invoke(
    predictor: &mut dyn SocPredictor,
    sample: &TelemetrySample,
) -> Result<(Option<f64>, BufferStatus), CycleError> {
    let prediction = predictor
        .predict(sample.voltage, sample.current, sample.temperature)
        .map_err(|e| CycleError::Unexpected(e.to_string()))?;

    let status = predictor.buffer_status();
    let soc = match prediction {
        Prediction::Buffering { fill_level } => {
            tracing::debug!(fill_level, target = status.target_size, "Predictor buffering");
            None
        }
        Prediction::Ready { soc_percent } => Some(soc_percent),
    };

    Ok((soc, status))
}
