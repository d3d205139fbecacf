// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod ocv_predictor;
pub mod thingspeak_client;
