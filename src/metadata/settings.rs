//! Persisted depth settings.
//!
//! Exports carry the parameters that produced them as a JSON `tEXt` record,
//! so reopening the file restores the same look.

use crate::core::types::{clamp_unit, FilterParameters};
use crate::metadata::png::{read_text_record, write_text_record};
use serde::{Deserialize, Serialize};

/// Record key for persisted settings.
pub const SETTINGS_KEY: &str = "SoftSin-Depth";

/// Schema version written by this crate.
pub const SETTINGS_VERSION: u32 = 1;

/// Largest radius accepted from a persisted record.
pub const MAX_PERSISTED_RADIUS: u32 = 64;

/// JSON shape of the settings record.
///
/// Fields are loose `f64`s on the wire; [`DepthSettings::to_params`] clamps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthSettings {
    /// Schema version.
    pub version: u32,
    /// Bias.
    pub bias: f64,
    /// Contrast.
    pub contrast: f64,
    /// Edge amount.
    pub edge: f64,
    /// Guided-filter radius in pixels, stored as-is.
    pub smooth: f64,
    /// Inversion.
    pub invert: bool,
    /// Transfer function the values were chosen under.
    pub gamma: String,
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self::from_params(&FilterParameters::default())
    }
}

impl DepthSettings {
    /// Capture a parameter set.
    pub fn from_params(params: &FilterParameters) -> Self {
        Self {
            version: SETTINGS_VERSION,
            bias: params.bias as f64,
            contrast: params.contrast as f64,
            edge: params.edge_amount as f64,
            smooth: params.smooth_radius as f64,
            invert: params.invert,
            gamma: "srgb".to_string(),
        }
    }

    /// Convert to parameters, clamping every field into range.
    ///
    /// `smooth` is read as the radius itself: rounded, then clamped to
    /// `0..=MAX_PERSISTED_RADIUS`. Older SoftSin exports stored a slider
    /// value that was widened to a radius of `smooth * 2 + 2` at render
    /// time. Those records are not translated, so they restore a smaller
    /// radius here than the one their map was rendered with.
    pub fn to_params(&self) -> FilterParameters {
        let defaults = FilterParameters::default();
        let smooth = if self.smooth.is_finite() {
            self.smooth.round().clamp(0.0, MAX_PERSISTED_RADIUS as f64) as u32
        } else {
            0
        };
        FilterParameters {
            bias: clamp_unit(self.bias as f32, defaults.bias),
            contrast: clamp_unit(self.contrast as f32, defaults.contrast),
            edge_amount: clamp_unit(self.edge as f32, defaults.edge_amount),
            smooth_radius: smooth,
            invert: self.invert,
        }
    }

    /// Parse a record value. Corrupt JSON is logged and yields `None`.
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("ignoring corrupt {} record: {}", SETTINGS_KEY, e);
                None
            }
        }
    }

    /// Serialize to the record value.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Read persisted parameters from a container, if present and parseable.
pub fn read_settings(container: &[u8]) -> Option<FilterParameters> {
    let json = read_text_record(container, SETTINGS_KEY)?;
    DepthSettings::parse(&json).map(|s| s.to_params())
}

/// Stamp `params` into a container.
pub fn write_settings(container: &[u8], params: &FilterParameters) -> serde_json::Result<Vec<u8>> {
    let json = DepthSettings::from_params(params).to_json()?;
    Ok(write_text_record(container, SETTINGS_KEY, &json))
}
