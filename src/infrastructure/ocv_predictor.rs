// Open-circuit-voltage predictor - windowed SOC estimate used when no trained model is wired in
use crate::application::soc_predictor::SocPredictor;
use crate::domain::prediction::{BufferStatus, Prediction, PredictorError};
use crate::infrastructure::config::PredictorSettings;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Reading {
    voltage: f64,
    current: f64,
}

/// Keeps the last `window_size` readings and, once the window is full, maps
/// the IR-compensated mean voltage onto the configured OCV curve.
#[derive(Debug)]
pub struct OcvPredictor {
    window: VecDeque<Reading>,
    window_size: usize,
    internal_resistance_ohms: f64,
    temperature_range: (f64, f64),
    curve: Vec<(f64, f64)>,
}

impl OcvPredictor {
    pub fn new(settings: &PredictorSettings) -> Result<Self, PredictorError> {
        if settings.window_size == 0 {
            return Err(PredictorError::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }

        let [min_temp, max_temp] = settings.temperature_range;
        if min_temp.partial_cmp(&max_temp) != Some(std::cmp::Ordering::Less) {
            return Err(PredictorError::InvalidConfig(format!(
                "temperature_range [{}, {}] is empty",
                min_temp, max_temp
            )));
        }

        if !settings.internal_resistance_ohms.is_finite() || settings.internal_resistance_ohms < 0.0 {
            return Err(PredictorError::InvalidConfig(
                "internal_resistance_ohms must be a non-negative number".to_string(),
            ));
        }

        let curve: Vec<(f64, f64)> = settings.ocv_curve.iter().map(|p| (p[0], p[1])).collect();
        validate_curve(&curve)?;

        Ok(Self {
            window: VecDeque::with_capacity(settings.window_size),
            window_size: settings.window_size,
            internal_resistance_ohms: settings.internal_resistance_ohms,
            temperature_range: (min_temp, max_temp),
            curve,
        })
    }

    /// Huge finite readings can still overflow the window sums, so every
    /// intermediate value is checked before it reaches the curve lookup.
    fn estimate(&self) -> Result<f64, PredictorError> {
        let n = self.window.len() as f64;
        let voltage = self.window.iter().map(|r| r.voltage).sum::<f64>() / n;
        if !voltage.is_finite() {
            return Err(PredictorError::NonFinite("mean voltage"));
        }
        let current = self.window.iter().map(|r| r.current).sum::<f64>() / n;
        if !current.is_finite() {
            return Err(PredictorError::NonFinite("mean current"));
        }

        // discharge current is positive and pulls terminal voltage below OCV
        let ocv = voltage + current * self.internal_resistance_ohms;
        if !ocv.is_finite() {
            return Err(PredictorError::NonFinite("open-circuit voltage"));
        }
        Ok(interpolate(&self.curve, ocv).clamp(0.0, 100.0))
    }
}

fn validate_curve(curve: &[(f64, f64)]) -> Result<(), PredictorError> {
    if curve.len() < 2 {
        return Err(PredictorError::InvalidConfig(
            "ocv_curve needs at least two points".to_string(),
        ));
    }

    for (voltage, soc) in curve {
        if !voltage.is_finite() || !(0.0..=100.0).contains(soc) {
            return Err(PredictorError::InvalidConfig(format!(
                "ocv_curve point [{}, {}] is invalid",
                voltage, soc
            )));
        }
    }

    if curve.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
        return Err(PredictorError::InvalidConfig(
            "ocv_curve voltages must be strictly increasing".to_string(),
        ));
    }

    Ok(())
}

/// Piecewise-linear lookup, flat beyond both ends of the curve
fn interpolate(curve: &[(f64, f64)], voltage: f64) -> f64 {
    let (first_v, first_soc) = curve[0];
    let (last_v, last_soc) = curve[curve.len() - 1];

    if voltage <= first_v {
        return first_soc;
    }
    if voltage >= last_v {
        return last_soc;
    }

    // NaN fails both end checks and every comparison below
    let upper = curve
        .partition_point(|(v, _)| *v < voltage)
        .clamp(1, curve.len() - 1);
    let (v0, s0) = curve[upper - 1];
    let (v1, s1) = curve[upper];
    s0 + (voltage - v0) / (v1 - v0) * (s1 - s0)
}

impl SocPredictor for OcvPredictor {
    fn predict(
        &mut self,
        voltage: f64,
        current: f64,
        temperature: f64,
    ) -> Result<Prediction, PredictorError> {
        for (name, value) in [
            ("voltage", voltage),
            ("current", current),
            ("temperature", temperature),
        ] {
            if !value.is_finite() {
                return Err(PredictorError::NonFinite(name));
            }
        }

        let (min, max) = self.temperature_range;
        if !(min..=max).contains(&temperature) {
            return Err(PredictorError::OutOfRange {
                quantity: "temperature",
                value: temperature,
                min,
                max,
            });
        }

        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(Reading { voltage, current });

        if !self.buffer_status().is_full() {
            return Ok(Prediction::Buffering {
                fill_level: self.window.len(),
            });
        }

        Ok(Prediction::Ready {
            soc_percent: self.estimate()?,
        })
    }

    fn buffer_status(&self) -> BufferStatus {
        BufferStatus::new(self.window.len(), self.window_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(window_size: usize) -> PredictorSettings {
        PredictorSettings {
            window_size,
            internal_resistance_ohms: 0.0,
            temperature_range: [-20.0, 60.0],
            ocv_curve: vec![[3.0, 0.0], [3.6, 20.0], [4.2, 100.0]],
        }
    }

    #[test]
    fn test_buffers_until_window_full() {
        let mut predictor = OcvPredictor::new(&settings(3)).unwrap();

        assert_eq!(
            predictor.predict(3.6, 0.0, 25.0),
            Ok(Prediction::Buffering { fill_level: 1 })
        );
        assert_eq!(
            predictor.predict(3.6, 0.0, 25.0),
            Ok(Prediction::Buffering { fill_level: 2 })
        );
        assert_eq!(predictor.buffer_status(), BufferStatus::new(2, 3));
        match predictor.predict(3.6, 0.0, 25.0).unwrap() {
            Prediction::Ready { soc_percent } => assert!((soc_percent - 20.0).abs() < 1e-9),
            other => panic!("expected prediction, got {:?}", other),
        }
        assert!(predictor.buffer_status().is_full());
    }

    #[test]
    fn test_window_slides() {
        let mut predictor = OcvPredictor::new(&settings(2)).unwrap();
        predictor.predict(3.0, 0.0, 25.0).unwrap();
        predictor.predict(3.0, 0.0, 25.0).unwrap();

        let prediction = predictor.predict(4.2, 0.0, 25.0).unwrap();

        // mean of 3.0 and 4.2 is 3.6
        match prediction {
            Prediction::Ready { soc_percent } => assert!((soc_percent - 20.0).abs() < 1e-9),
            other => panic!("expected prediction, got {:?}", other),
        }
        assert_eq!(predictor.buffer_status(), BufferStatus::new(2, 2));
    }

    #[test]
    fn test_interpolates_and_clamps() {
        let curve = vec![(3.0, 0.0), (3.6, 20.0), (4.2, 100.0)];

        assert_eq!(interpolate(&curve, 2.5), 0.0);
        assert_eq!(interpolate(&curve, 4.5), 100.0);
        assert!((interpolate(&curve, 3.9) - 60.0).abs() < 1e-9);
        assert!((interpolate(&curve, 3.3) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_ir_compensation_raises_estimate_under_load() {
        let mut config = settings(1);
        config.internal_resistance_ohms = 0.1;
        let mut predictor = OcvPredictor::new(&config).unwrap();

        // 3.5V at 1A discharge with 0.1 ohm reads as 3.6V resting
        match predictor.predict(3.5, 1.0, 25.0).unwrap() {
            Prediction::Ready { soc_percent } => assert!((soc_percent - 20.0).abs() < 1e-9),
            other => panic!("expected prediction, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_sample_does_not_enter_window() {
        let mut predictor = OcvPredictor::new(&settings(3)).unwrap();

        let err = predictor.predict(3.7, 1.2, 95.0).unwrap_err();
        assert!(matches!(err, PredictorError::OutOfRange { quantity: "temperature", .. }));
        assert_eq!(
            predictor.predict(f64::NAN, 1.2, 25.0),
            Err(PredictorError::NonFinite("voltage"))
        );
        assert_eq!(predictor.buffer_status().current_size, 0);
    }

    #[test]
    fn test_overflowing_window_is_an_error_not_a_panic() {
        let mut predictor = OcvPredictor::new(&PredictorSettings::default()).unwrap();

        let results: Vec<_> = (0..10).map(|_| predictor.predict(3.7, 1e308, 25.0)).collect();

        assert!(results[..9]
            .iter()
            .all(|r| matches!(r, Ok(Prediction::Buffering { .. }))));
        assert_eq!(results[9], Err(PredictorError::NonFinite("mean current")));

        let mut predictor = OcvPredictor::new(&settings(2)).unwrap();
        predictor.predict(1e308, 0.0, 25.0).unwrap();
        assert_eq!(
            predictor.predict(1e308, 0.0, 25.0),
            Err(PredictorError::NonFinite("mean voltage"))
        );
    }

    #[test]
    fn test_interpolate_nan_stays_in_bounds() {
        let curve = vec![(3.0, 0.0), (3.6, 20.0), (4.2, 100.0)];

        assert!(interpolate(&curve, f64::NAN).is_nan());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(OcvPredictor::new(&settings(0)).is_err());

        let mut unordered = settings(10);
        unordered.ocv_curve = vec![[3.0, 0.0], [3.0, 50.0]];
        assert!(OcvPredictor::new(&unordered).is_err());

        let mut short = settings(10);
        short.ocv_curve = vec![[3.0, 0.0]];
        assert!(OcvPredictor::new(&short).is_err());

        let mut out_of_range = settings(10);
        out_of_range.ocv_curve = vec![[3.0, 0.0], [4.2, 120.0]];
        assert!(OcvPredictor::new(&out_of_range).is_err());

        let mut inverted = settings(10);
        inverted.temperature_range = [40.0, 10.0];
        assert!(OcvPredictor::new(&inverted).is_err());
    }

    #[test]
    fn test_default_settings_build() {
        let predictor = OcvPredictor::new(&PredictorSettings::default()).unwrap();
        assert_eq!(predictor.buffer_status(), BufferStatus::new(0, 10));
    }
}
