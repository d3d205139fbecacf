// Console reporter - Human-readable status lines on stdout
use crate::application::bridge_service::ShutdownKind;
use crate::application::cycle_reporter::CycleReporter;
use crate::domain::outcome::{CycleError, CycleOutcome};
use crate::domain::statistics::RunStatistics;
use std::io::{self, Write};
use std::time::Duration;

const RULE_WIDTH: usize = 80;

pub struct ConsoleReporter<W: Write + Send> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> CycleReporter for ConsoleReporter<W> {
    fn cycle(&mut self, outcome: &CycleOutcome) -> io::Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.out, "[{}] {}", now, status_line(outcome))?;
        self.out.flush()
    }

    fn summary(&mut self, stats: &RunStatistics) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary_line(stats))?;
        self.out.flush()
    }

    fn shutdown(
        &mut self,
        reason: &ShutdownKind,
        stats: &RunStatistics,
        uptime: Duration,
    ) -> io::Result<()> {
        self.out.write_all(final_summary(reason, stats, uptime).as_bytes())?;
        self.out.flush()
    }
}

/// One-line description of a finished cycle, without the timestamp
pub fn status_line(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Success {
            sample,
            prediction,
            buffer,
        } => {
            let sensor = format!(
                "Sensor: {:.2}V, {:.2}A, {:.1}°C",
                sample.voltage, sample.current, sample.temperature
            );
            match prediction {
                Some(soc) => format!("{} | SOC: {:.2}%", sensor, soc),
                None => format!(
                    "{} | Buffering data... ({}/{})",
                    sensor, buffer.current_size, buffer.target_size
                ),
            }
        }
        CycleOutcome::IncompleteData { missing } => format!(
            "Incomplete data received (missing {}) - waiting for sensors...",
            missing.join(", ")
        ),
        CycleOutcome::TransientError(err) => match err {
            CycleError::HttpStatus(status) => format!("HTTP error {} - retrying...", status),
            CycleError::Timeout => "Request timeout - check internet connection".to_string(),
            CycleError::Connection(detail) => {
                format!("Connection error - is internet available? ({})", detail)
            }
            CycleError::Parse(detail) => format!("Data parsing error: {}", detail),
            CycleError::Unexpected(detail) => format!("Unexpected error: {}", detail),
        },
    }
}

pub fn summary_line(stats: &RunStatistics) -> String {
    format!(
        "Statistics: {} predictions made, {} errors encountered",
        stats.predictions_emitted, stats.total_errors
    )
}

pub fn final_summary(reason: &ShutdownKind, stats: &RunStatistics, uptime: Duration) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let (title, closing) = match reason {
        ShutdownKind::Graceful => (
            "BRIDGE SHUTDOWN REQUESTED".to_string(),
            "Bridge stopped gracefully.".to_string(),
        ),
        ShutdownKind::Fatal(message) => (
            "CRITICAL ERROR - BRIDGE SHUTDOWN".to_string(),
            format!("Error: {}", message),
        ),
    };

    let mut text = String::new();
    text.push('\n');
    text.push_str(&format!("{}\n{}\n{}\n", rule, title, rule));
    text.push_str("Final Statistics:\n");
    text.push_str(&format!(
        "  - Total data points received: {}\n",
        stats.samples_received
    ));
    text.push_str(&format!(
        "  - Total predictions made: {}\n",
        stats.predictions_emitted
    ));
    text.push_str(&format!("  - Total errors encountered: {}\n", stats.total_errors));
    text.push_str(&format!("  - Uptime: {}\n", format_uptime(uptime)));
    text.push_str(&format!("\n{}\n{}\n", closing, rule));
    text
}

/// Startup banner; the API key is masked
pub fn banner(channel_id: &str, poll_interval: Duration, endpoint: &str, api_key: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let masked = mask_key(endpoint, api_key);
    format!(
        "{rule}\nTHINGSPEAK BRIDGE - SOC PREDICTION CONNECTOR\n{rule}\nChannel ID: {}\nPoll Interval: {} seconds\nAPI Endpoint: {}\n{rule}\n",
        channel_id,
        poll_interval.as_secs(),
        masked,
    )
}

/// Only the value of the `api_key` query parameter is replaced
fn mask_key(endpoint: &str, api_key: &str) -> String {
    const PARAM: &str = "api_key=";

    let Some(pos) = endpoint
        .match_indices(PARAM)
        .map(|(i, _)| i)
        .find(|&i| endpoint[..i].ends_with(['?', '&']))
    else {
        // custom templates may carry the key elsewhere; mask only an exact segment match
        return endpoint
            .split('/')
            .map(|segment| {
                if !api_key.is_empty() && segment == api_key {
                    "****"
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/");
    };

    let value_start = pos + PARAM.len();
    let value_end = endpoint[value_start..]
        .find(['&', '#'])
        .map_or(endpoint.len(), |offset| value_start + offset);

    format!("{}****{}", &endpoint[..value_start], &endpoint[value_end..])
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
