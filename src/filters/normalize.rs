//! Percentile contrast stretch.
//!
//! Black and white points come from sorted samples rather than the raw min and
//! max, so a handful of specular highlights or dead pixels cannot flatten the
//! whole field.

use crate::core::stage::{FieldStage, StageKind};
use crate::core::types::LinearLuminance;

/// Black and white points found by [`percentile_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBounds {
    /// Value mapped to 0.
    pub lo: f32,
    /// Value mapped to 1.
    pub hi: f32,
}

impl PercentileBounds {
    /// Multiplier applied after subtracting `lo`. Falls back to 1 for a flat field.
    pub fn scale(&self) -> f32 {
        if self.hi > self.lo {
            1.0 / (self.hi - self.lo)
        } else {
            1.0
        }
    }
}

/// Estimate the `low`/`high` percentiles of `field` from at most `max_samples` values.
///
/// Sampling takes every `stride`-th element starting at 0, so the result is
/// deterministic for a given input. Returns `None` for an empty field.
pub fn percentile_bounds(
    field: &[f32],
    low: f32,
    high: f32,
    max_samples: usize,
) -> Option<PercentileBounds> {
    if field.is_empty() {
        return None;
    }
    let stride = field.len().div_ceil(max_samples.max(1)).max(1);
    let mut samples: Vec<f32> = field.iter().step_by(stride).copied().collect();
    samples.sort_unstable_by(|a, b| a.total_cmp(b));

    let last = (samples.len() - 1) as f32;
    let pick = |p: f32| samples[(p.clamp(0.0, 1.0) * last).floor() as usize];
    Some(PercentileBounds {
        lo: pick(low),
        hi: pick(high),
    })
}

/// Stretch `field` so the chosen percentiles land on 0 and 1, clamping the tails.
pub fn percentile_normalize(field: &[f32], low: f32, high: f32, max_samples: usize) -> Vec<f32> {
    let Some(bounds) = percentile_bounds(field, low, high, max_samples) else {
        return Vec::new();
    };
    let scale = bounds.scale();
    log::trace!(
        "percentile bounds lo={:.5} hi={:.5} scale={:.3}",
        bounds.lo,
        bounds.hi,
        scale
    );
    field
        .iter()
        .map(|&x| clamp01((x - bounds.lo) * scale))
        .collect()
}

/// Clamp to `[0, 1]`; NaN maps to 0.
#[inline]
pub(crate) fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Percentile stretch as a pipeline stage. Ignores the incoming field and
/// normalizes the luminance guide itself, so it always runs first.
#[derive(Debug, Clone, Copy)]
pub struct PercentileNormalize {
    /// Black point percentile.
    pub low: f32,
    /// White point percentile.
    pub high: f32,
    /// Sample cap.
    pub max_samples: usize,
}

impl FieldStage for PercentileNormalize {
    fn id(&self) -> &'static str {
        "percentile_normalize"
    }

    fn kind(&self) -> StageKind {
        StageKind::Normalize
    }

    fn apply(&self, guide: &LinearLuminance, _field: Vec<f32>) -> Vec<f32> {
        percentile_normalize(guide.as_slice(), self.low, self.high, self.max_samples)
    }
}
