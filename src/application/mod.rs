// Application layer - Bridge loop and the ports it drives
pub mod bridge_service;
pub mod cycle_reporter;
pub mod soc_predictor;
pub mod telemetry_source;
