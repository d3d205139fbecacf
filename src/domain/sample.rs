// Telemetry sample domain model and feed extraction
use serde_json::{Map, Value};
use thiserror::Error;

pub const VOLTAGE_FIELD: &str = "field1";
pub const CURRENT_FIELD: &str = "field2";
pub const TEMPERATURE_FIELD: &str = "field3";

const REQUIRED_FIELDS: [&str; 3] = [VOLTAGE_FIELD, CURRENT_FIELD, TEMPERATURE_FIELD];

/// Parsed body of a feed response
pub type FeedEntry = Map<String, Value>;

/// One battery reading taken from the latest feed entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    /// The sensors have not reported every field yet
    #[error("incomplete data, missing {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("field {field} is not numeric: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl TelemetrySample {
    pub fn new(voltage: f64, current: f64, temperature: f64) -> Self {
        Self {
            voltage,
            current,
            temperature,
        }
    }

    /// Build a sample from a feed entry.
    ///
    /// Presence of all three fields is checked before any conversion so that a
    /// half-reported entry is always `Incomplete`, never `InvalidValue`.
    pub fn extract(entry: &FeedEntry) -> Result<Self, ExtractError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| entry.get(*field).is_none_or(Value::is_null))
            .collect();

        if !missing.is_empty() {
            return Err(ExtractError::Incomplete { missing });
        }

        Ok(Self::new(
            numeric_field(entry, VOLTAGE_FIELD)?,
            numeric_field(entry, CURRENT_FIELD)?,
            numeric_field(entry, TEMPERATURE_FIELD)?,
        ))
    }
}

/// ThingSpeak stores every field as text, but numbers are accepted too
fn numeric_field(entry: &FeedEntry, field: &'static str) -> Result<f64, ExtractError> {
    let value = &entry[field];
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| ExtractError::InvalidValue {
        field,
        value: value.to_string(),
    })
}
