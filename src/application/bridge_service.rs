// Bridge service - Fixed-interval fetch, extract, infer and report loop
use crate::application::cycle_reporter::CycleReporter;
use crate::application::soc_predictor::{invoke, SocPredictor};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::outcome::{CycleError, CycleOutcome};
use crate::domain::sample::{ExtractError, TelemetrySample};
use crate::domain::statistics::RunStatistics;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownKind {
    /// Interrupt received between ticks
    Graceful,
    /// An error escaped the tick body
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    Running,
    ShuttingDown(ShutdownKind),
}

/// What the loop hands back once it has stopped
#[derive(Debug)]
pub struct RunReport {
    pub state: LoopState,
    pub statistics: RunStatistics,
    pub uptime: Duration,
}

impl RunReport {
    pub fn is_graceful(&self) -> bool {
        self.state == LoopState::ShuttingDown(ShutdownKind::Graceful)
    }
}

pub struct BridgeService {
    source: Arc<dyn TelemetrySource>,
    predictor: Box<dyn SocPredictor>,
    reporter: Box<dyn CycleReporter>,
    poll_interval: Duration,
    statistics: RunStatistics,
    state: LoopState,
}

impl BridgeService {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        predictor: Box<dyn SocPredictor>,
        reporter: Box<dyn CycleReporter>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            predictor,
            reporter,
            poll_interval,
            statistics: RunStatistics::new(),
            state: LoopState::Running,
        }
    }

    /// One fetch -> extract -> infer pass, short-circuiting on the first failure.
    ///
    /// Only `samples_received` is touched here; the remaining counters are
    /// applied from the returned outcome.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let entry = match self.source.fetch_latest().await {
            Ok(entry) => entry,
            Err(e) => return CycleOutcome::TransientError(e.into()),
        };

        let sample = match TelemetrySample::extract(&entry) {
            Ok(sample) => sample,
            Err(ExtractError::Incomplete { missing }) => {
                return CycleOutcome::IncompleteData { missing };
            }
            Err(e @ ExtractError::InvalidValue { .. }) => {
                return CycleOutcome::TransientError(CycleError::Parse(e.to_string()));
            }
        };
        self.statistics.record_sample();

        match invoke(self.predictor.as_mut(), &sample) {
            Ok((prediction, buffer)) => CycleOutcome::Success {
                sample,
                prediction,
                buffer,
            },
            Err(e) => CycleOutcome::TransientError(e),
        }
    }

    /// Run one cycle, account for it and report it.
    ///
    /// Only reporter failures are returned as errors.
    pub async fn tick(&mut self) -> io::Result<CycleOutcome> {
        let outcome = self.run_cycle().await;
        let summary_due = self.statistics.record_outcome(&outcome);

        match &outcome {
            CycleOutcome::Success {
                prediction, buffer, ..
            } => debug!(
                ?prediction,
                fill_level = buffer.current_size,
                samples = self.statistics.samples_received,
                "Cycle complete"
            ),
            CycleOutcome::TransientError(e) => warn!(
                error = %e,
                consecutive_errors = self.statistics.consecutive_errors,
                total_errors = self.statistics.total_errors,
                "Cycle failed, waiting for next poll"
            ),
            CycleOutcome::IncompleteData { missing } => {
                info!(?missing, "Incomplete data received, waiting for sensors")
            }
        }

        self.reporter.cycle(&outcome)?;
        if summary_due {
            self.reporter.summary(&self.statistics)?;
        }

        Ok(outcome)
    }

    /// Drive ticks until an interrupt arrives or a tick fails fatally.
    ///
    /// The interrupt is only observed between ticks: an in-flight fetch always
    /// runs to completion or to its own timeout first.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> RunReport {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Starting bridge loop"
        );
        let started = Instant::now();

        let kind = loop {
            if shutdown_requested(&mut shutdown) {
                break ShutdownKind::Graceful;
            }

            if let Err(e) = self.tick().await {
                error!(error = %e, "Bridge loop failed");
                break ShutdownKind::Fatal(e.to_string());
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = shutdown.recv() => break ShutdownKind::Graceful,
            }
        };

        info!(reason = ?kind, "Shutting down bridge loop");
        self.state = LoopState::ShuttingDown(kind.clone());
        let uptime = started.elapsed();

        if let Err(e) = self.reporter.shutdown(&kind, &self.statistics, uptime) {
            error!(error = %e, "Failed to write final statistics");
        }

        RunReport {
            state: self.state,
            statistics: self.statistics,
            uptime,
        }
    }
}

/// A closed or lagged channel counts as a request too
fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}
