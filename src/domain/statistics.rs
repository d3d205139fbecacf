// Run statistics - process-lifetime counters owned by the bridge loop
use super::outcome::CycleOutcome;

/// Every Nth prediction triggers an aggregate statistics report
pub const SUMMARY_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub samples_received: u64,
    pub predictions_emitted: u64,
    pub consecutive_errors: u64,
    pub total_errors: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sample made it through extraction
    pub fn record_sample(&mut self) {
        self.samples_received += 1;
    }

    /// Apply the outcome of a finished cycle.
    ///
    /// Returns true when this cycle emitted a prediction that lands on a
    /// summary boundary.
    pub fn record_outcome(&mut self, outcome: &CycleOutcome) -> bool {
        match outcome {
            CycleOutcome::Success { prediction, .. } => {
                self.consecutive_errors = 0;
                if prediction.is_some() {
                    self.predictions_emitted += 1;
                    return self.predictions_emitted % SUMMARY_EVERY == 0;
                }
                false
            }
            CycleOutcome::TransientError(_) => {
                self.consecutive_errors += 1;
                self.total_errors += 1;
                false
            }
            CycleOutcome::IncompleteData { .. } => false,
        }
    }
}
