use crate::domain::prediction::DEFAULT_WINDOW_SIZE;
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// ThingSpeak accepts one request per 15 seconds on the free tier
pub const MIN_POLL_INTERVAL_SECS: u64 = 15;

const DEFAULT_URL_TEMPLATE: &str =
    "https://api.thingspeak.com/channels/${channel_id}/feeds/last.json?api_key=${api_key}";

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub thingspeak: ThingSpeakSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub predictor: PredictorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThingSpeakSettings {
    pub channel_id: String,
    pub read_api_key: String,
    #[serde(default = "default_url_template")]
    pub url_template: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictorSettings {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default)]
    pub internal_resistance_ohms: f64,
    #[serde(default = "default_temperature_range")]
    pub temperature_range: [f64; 2],
    /// `[voltage, soc_percent]` points, ascending by voltage
    #[serde(default = "default_ocv_curve")]
    pub ocv_curve: Vec<[f64; 2]>,
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

fn default_interval_secs() -> u64 {
    16
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_temperature_range() -> [f64; 2] {
    [-20.0, 60.0]
}

/// Resting voltage of a single Li-ion cell against state of charge.
/// Other chemistries (e.g. a 12 V lead-acid battery) need their own `ocv_curve`.
fn default_ocv_curve() -> Vec<[f64; 2]> {
    vec![
        [3.00, 0.0],
        [3.45, 5.0],
        [3.60, 10.0],
        [3.68, 20.0],
        [3.74, 30.0],
        [3.78, 40.0],
        [3.82, 50.0],
        [3.87, 60.0],
        [3.93, 70.0],
        [4.00, 80.0],
        [4.08, 90.0],
        [4.20, 100.0],
    ]
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            internal_resistance_ohms: 0.0,
            temperature_range: default_temperature_range(),
            ocv_curve: default_ocv_curve(),
        }
    }
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.polling.timeout_secs)
    }

    /// Endpoint URL with channel id and API key substituted
    pub fn endpoint_url(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert(
            "channel_id".to_string(),
            urlencoding::encode(&self.thingspeak.channel_id).into_owned(),
        );
        vars.insert(
            "api_key".to_string(),
            urlencoding::encode(&self.thingspeak.read_api_key).into_owned(),
        );
        prepare_url(&self.thingspeak.url_template, &vars)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.thingspeak.channel_id.trim().is_empty(),
            "thingspeak.channel_id must be set"
        );
        ensure!(
            !self.thingspeak.read_api_key.trim().is_empty(),
            "thingspeak.read_api_key must be set"
        );
        ensure!(
            self.polling.interval_secs >= MIN_POLL_INTERVAL_SECS,
            "polling.interval_secs is {}, the remote service allows at most one request every {}s",
            self.polling.interval_secs,
            MIN_POLL_INTERVAL_SECS
        );
        ensure!(
            self.polling.timeout_secs > 0 && self.polling.timeout_secs < self.polling.interval_secs,
            "polling.timeout_secs must be between 1 and {}",
            self.polling.interval_secs - 1
        );
        Ok(())
    }
}

/// Load `config/bridge.*` (optional) overlaid with `BRIDGE_*` environment variables
pub fn load_bridge_config() -> anyhow::Result<BridgeConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/bridge").required(false))
        .add_source(
            config::Environment::with_prefix("BRIDGE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let bridge: BridgeConfig = settings
        .try_deserialize()
        .context("Failed to parse bridge configuration")?;
    bridge.validate()?;
    Ok(bridge)
}

/// Replace `${name}` placeholders in a URL template
pub fn prepare_url(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_config(interval_secs: u64, timeout_secs: u64) -> BridgeConfig {
        BridgeConfig {
            thingspeak: ThingSpeakSettings {
                channel_id: "123456".to_string(),
                read_api_key: "ABC DEF".to_string(),
                url_template: default_url_template(),
            },
            polling: PollingSettings {
                interval_secs,
                timeout_secs,
            },
            predictor: PredictorSettings::default(),
        }
    }

    #[test]
    fn test_prepare_url() {
        let mut vars = HashMap::new();
        vars.insert("channel_id".to_string(), "42".to_string());
        vars.insert("api_key".to_string(), "KEY".to_string());

        let result = prepare_url("http://host/channels/${channel_id}/last.json?api_key=${api_key}", &vars);

        assert_eq!(result, "http://host/channels/42/last.json?api_key=KEY");
    }

    #[test]
    fn test_endpoint_url_encodes_credentials() {
        let url = bridge_config(16, 10).endpoint_url();

        assert_eq!(
            url,
            "https://api.thingspeak.com/channels/123456/feeds/last.json?api_key=ABC%20DEF"
        );
    }

    #[test]
    fn test_defaults_pass_validation() {
        let bridge = bridge_config(default_interval_secs(), default_timeout_secs());

        assert!(bridge.validate().is_ok());
        assert_eq!(bridge.poll_interval(), Duration::from_secs(16));
        assert_eq!(bridge.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_interval_below_rate_limit_rejected() {
        let err = bridge_config(10, 5).validate().unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_timeout_must_fit_in_interval() {
        assert!(bridge_config(16, 0).validate().is_err());
        assert!(bridge_config(16, 16).validate().is_err());
        assert!(bridge_config(16, 15).validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut bridge = bridge_config(16, 10);
        bridge.thingspeak.read_api_key = "  ".to_string();
        assert!(bridge.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_section_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[thingspeak]\nchannel_id = \"987\"\nread_api_key = \"XYZ\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let bridge: BridgeConfig = settings.try_deserialize().unwrap();

        assert_eq!(bridge.thingspeak.url_template, DEFAULT_URL_TEMPLATE);
        assert_eq!(bridge.polling.interval_secs, 16);
        assert_eq!(bridge.predictor.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(bridge.predictor.ocv_curve.len(), 12);
        assert!(bridge.validate().is_ok());
    }

    #[test]
    fn test_example_config_describes_lead_acid_battery() {
        use crate::application::soc_predictor::SocPredictor;
        use crate::domain::prediction::Prediction;
        use crate::infrastructure::ocv_predictor::OcvPredictor;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../config/bridge.example.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let bridge: BridgeConfig = settings.try_deserialize().unwrap();
        assert!(bridge.validate().is_ok());

        let mut predictor = OcvPredictor::new(&bridge.predictor).unwrap();
        let mut last = None;
        for _ in 0..bridge.predictor.window_size {
            last = Some(predictor.predict(12.6, 0.0, 25.0).unwrap());
        }

        // 12.6 V resting sits between the 80% and 90% points
        match last {
            Some(Prediction::Ready { soc_percent }) => {
                assert!((85.0..95.0).contains(&soc_percent), "{}", soc_percent)
            }
            other => panic!("expected prediction, got {:?}", other),
        }
    }
}
