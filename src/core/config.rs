//! Pipeline configuration.
//!
//! Holds the numeric constants of the depth pipeline and the repaint cadence.
//! Defaults reproduce the stock behavior; a TOML file can override any subset:
//!
//! ```toml
//! low_percentile = 0.02
//! guided_eps = 0.0005
//! refresh_interval_ms = 33
//! ```

use crate::core::error::{DepthError, DepthResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default cap on samples taken by the percentile normalizer.
pub const DEFAULT_MAX_SAMPLES: usize = 200_000;

/// Default guided filter regularizer.
pub const DEFAULT_GUIDED_EPS: f32 = 1e-3;

/// Default ceiling for the edge blend weight.
pub const DEFAULT_EDGE_WEIGHT: f32 = 0.35;

/// Configuration for the depth pipeline and its scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Black point percentile for normalization.
    pub low_percentile: f32,
    /// White point percentile for normalization.
    pub high_percentile: f32,
    /// Maximum number of samples sorted to find the percentiles.
    pub max_samples: usize,
    /// Guided filter regularizer.
    pub guided_eps: f32,
    /// Blend weight applied at `edge_amount = 1`.
    pub edge_weight: f32,
    /// Edge amounts at or below this skip the Sobel pass entirely.
    pub edge_threshold: f32,
    /// Minimum interval between two scheduled render passes.
    pub refresh_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            low_percentile: 0.01,
            high_percentile: 0.99,
            max_samples: DEFAULT_MAX_SAMPLES,
            guided_eps: DEFAULT_GUIDED_EPS,
            edge_weight: DEFAULT_EDGE_WEIGHT,
            edge_threshold: 0.001,
            refresh_interval_ms: 16,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the normalization percentiles.
    pub fn with_percentiles(mut self, low: f32, high: f32) -> Self {
        self.low_percentile = low;
        self.high_percentile = high;
        self
    }

    /// Set the sample cap for percentile estimation.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Set the guided filter regularizer.
    pub fn with_guided_eps(mut self, eps: f32) -> Self {
        self.guided_eps = eps;
        self
    }

    /// Set the edge blend ceiling.
    pub fn with_edge_weight(mut self, weight: f32) -> Self {
        self.edge_weight = weight;
        self
    }

    /// Set the repaint interval in milliseconds.
    pub fn with_refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    /// Repaint interval as a `Duration`.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Parse from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> DepthResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DepthResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loaded pipeline config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Check that every value is usable by the pipeline.
    pub fn validate(&self) -> DepthResult<()> {
        let unit = |field: &'static str, v: f32| -> DepthResult<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(DepthError::InvalidConfig {
                    field,
                    reason: format!("{} is outside [0, 1]", v),
                })
            }
        };
        unit("low_percentile", self.low_percentile)?;
        unit("high_percentile", self.high_percentile)?;
        unit("edge_weight", self.edge_weight)?;

        if self.low_percentile >= self.high_percentile {
            return Err(DepthError::InvalidConfig {
                field: "low_percentile",
                reason: format!(
                    "{} must be below high_percentile {}",
                    self.low_percentile, self.high_percentile
                ),
            });
        }
        if self.max_samples == 0 {
            return Err(DepthError::InvalidConfig {
                field: "max_samples",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.guided_eps > 0.0 && self.guided_eps.is_finite()) {
            return Err(DepthError::InvalidConfig {
                field: "guided_eps",
                reason: format!("{} must be a positive finite number", self.guided_eps),
            });
        }
        if !(self.edge_threshold >= 0.0 && self.edge_threshold.is_finite()) {
            return Err(DepthError::InvalidConfig {
                field: "edge_threshold",
                reason: format!("{} must be non-negative", self.edge_threshold),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_samples, 200_000);
        assert_eq!(config.refresh_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str("guided_eps = 0.01\n").unwrap();
        assert_eq!(config.guided_eps, 0.01);
        assert_eq!(config.low_percentile, 0.01);
        assert_eq!(config.edge_weight, DEFAULT_EDGE_WEIGHT);
    }

    #[test]
    fn test_inverted_percentiles_rejected() {
        let err = PipelineConfig::new().with_percentiles(0.9, 0.1).validate().unwrap_err();
        assert!(matches!(err, DepthError::InvalidConfig { field: "low_percentile", .. }));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = PipelineConfig::from_toml_str("guided_eps = \"lots\"").unwrap_err();
        assert!(matches!(err, DepthError::ConfigParse(_)));
    }

    #[test]
    fn test_zero_eps_rejected() {
        assert!(PipelineConfig::new().with_guided_eps(0.0).validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval_ms = 33").unwrap();
        writeln!(file, "max_samples = 1000").unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.refresh_interval_ms, 33);
        assert_eq!(config.max_samples, 1000);
    }
}
