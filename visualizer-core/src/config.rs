//! # Configuration Module
//!
//! Every tunable of the detection pipeline and the trace renderer lives in
//! [`VisualizerConfig`]. The defaults are the values the visualizer ships
//! with; a JSON file may override any subset of them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tunables for detection, stability highlighting and trace rendering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Estimator confidence a reading must exceed to count as a detection.
    pub clarity_threshold: f32,
    /// Stricter confidence the readout needs before it shows a note.
    ///
    /// Kept separate from `clarity_threshold`; whether both gates are wanted
    /// is still a product question.
    pub display_clarity_threshold: f32,
    /// Lowest accepted fundamental, exclusive.
    pub min_pitch_hz: f32,
    /// Highest accepted fundamental, exclusive.
    pub max_pitch_hz: f32,
    /// Number of samples handed to the estimator each tick.
    pub analysis_window: usize,
    /// Consecutive ticks on one pitch class before it counts as held.
    pub stability_threshold: u32,
    /// Low-pass coefficient for the highlight fade.
    pub fade_speed: f32,
    /// Maximum number of history points kept.
    pub history_capacity: usize,
    /// Width of the visible trace, in milliseconds.
    pub time_window_ms: f64,
    /// Maximum pixel distance between connected trace points.
    pub proximity_px: f32,
    /// Maximum forward connections drawn from one trace point.
    pub max_connections: usize,
    /// Interval of the detection tick.
    pub tick_interval_ms: u64,
    /// Input level below which the estimator reports silence.
    pub input_gate_db: f32,
    /// Sample rate requested from the input device.
    pub preferred_sample_rate: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            clarity_threshold: 0.80,
            display_clarity_threshold: 0.95,
            min_pitch_hz: 60.0,
            max_pitch_hz: 1600.0,
            analysis_window: 2048,
            stability_threshold: 15,
            fade_speed: 0.2,
            history_capacity: 500,
            time_window_ms: 4000.0,
            proximity_px: 35.0,
            max_connections: 3,
            tick_interval_ms: 16,
            input_gate_db: -60.0,
            preferred_sample_rate: 44100,
        }
    }
}

impl VisualizerConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Fields absent from the file keep their default values.
    ///
    /// # Arguments
    /// * `path` - Path of the JSON file
    ///
    /// # Returns
    /// * `Ok(config)` - Parsed configuration
    /// * `Err(e)` - The file could not be read or is not valid JSON
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// RMS amplitude corresponding to `input_gate_db`.
    pub fn input_gate_amplitude(&self) -> f32 {
        10f32.powf(self.input_gate_db / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_shipping_values() {
        let config = VisualizerConfig::default();
        assert_eq!(config.clarity_threshold, 0.80);
        assert_eq!(config.display_clarity_threshold, 0.95);
        assert_eq!(config.history_capacity, 500);
        assert_eq!(config.stability_threshold, 15);
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "clarity_threshold": 0.7, "history_capacity": 64 }}"#).unwrap();

        let config = VisualizerConfig::load(file.path()).unwrap();
        assert_eq!(config.clarity_threshold, 0.7);
        assert_eq!(config.history_capacity, 64);
        assert_eq!(config.max_pitch_hz, 1600.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(VisualizerConfig::load(file.path()).is_err());
    }

    #[test]
    fn gate_amplitude_from_decibels() {
        let config = VisualizerConfig { input_gate_db: -20.0, ..Default::default() };
        assert!((config.input_gate_amplitude() - 0.1).abs() < 1e-6);
    }
}
