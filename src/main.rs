// Main entry point - Dependency injection and bridge startup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use anyhow::Context;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::application::bridge_service::{BridgeService, ShutdownKind, LoopState};
use crate::infrastructure::config::load_bridge_config;
use crate::infrastructure::ocv_predictor::OcvPredictor;
use crate::infrastructure::thingspeak_client::ThingSpeakClient;
use crate::presentation::console_reporter::{banner, ConsoleReporter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_bridge_config()?;
    let endpoint = config.endpoint_url();

    print!(
        "{}",
        banner(
            &config.thingspeak.channel_id,
            config.poll_interval(),
            &endpoint,
            &config.thingspeak.read_api_key,
        )
    );

    // Create predictor before anything touches the network
    tracing::info!(window_size = config.predictor.window_size, "Initializing predictor");
    let predictor = OcvPredictor::new(&config.predictor).context("Failed to initialize predictor")?;
    tracing::info!("Predictor initialized, waiting for data");

    // Create telemetry source (infrastructure layer)
    let source = Arc::new(ThingSpeakClient::new(endpoint, config.fetch_timeout())?);

    // Ctrl-C is only observed between ticks
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unable to listen for Ctrl-C");
                // hold the sender so the loop does not read a closed channel as a request
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let bridge = BridgeService::new(
        source,
        Box::new(predictor),
        Box::new(ConsoleReporter::stdout()),
        config.poll_interval(),
    );

    let report = bridge.run(shutdown_rx).await;
    tracing::info!(
        samples = report.statistics.samples_received,
        predictions = report.statistics.predictions_emitted,
        errors = report.statistics.total_errors,
        uptime_secs = report.uptime.as_secs(),
        "Bridge stopped"
    );

    if report.is_graceful() {
        return Ok(());
    }
    match report.state {
        LoopState::ShuttingDown(ShutdownKind::Fatal(message)) => {
            anyhow::bail!("bridge terminated: {}", message)
        }
        state => anyhow::bail!("bridge stopped in state {:?}", state),
    }
}
