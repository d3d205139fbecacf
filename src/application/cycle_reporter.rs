// Reporter trait for cycle results and run summaries
use crate::application::bridge_service::ShutdownKind;
use crate::domain::outcome::CycleOutcome;
use crate::domain::statistics::RunStatistics;
use std::io;
use std::time::Duration;

/// Presentation sink for the bridge loop.
///
/// A write failure here is not one of the recoverable cycle errors; it ends the
/// loop with a fatal shutdown.
pub trait CycleReporter: Send {
    /// Status line for one finished cycle
    fn cycle(&mut self, outcome: &CycleOutcome) -> io::Result<()>;

    /// Aggregate report emitted every `SUMMARY_EVERY` predictions
    fn summary(&mut self, stats: &RunStatistics) -> io::Result<()>;

    /// Final block, written once when the loop stops
    fn shutdown(
        &mut self,
        reason: &ShutdownKind,
        stats: &RunStatistics,
        uptime: Duration,
    ) -> io::Result<()>;
}
