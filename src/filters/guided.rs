//! Gray-guide guided filter.
//!
//! Smooths the normalized depth field while keeping the edge structure of the
//! luminance guide: inside flat guide regions the output is a local mean, and
//! across strong guide edges the local linear model follows the guide instead
//! of blurring through it.

use crate::core::stage::{FieldStage, StageKind};
use crate::core::types::LinearLuminance;
use crate::filters::blur::box_blur;
use crate::filters::normalize::clamp01;

/// Guided filter with guide `guide` (I) and input `input` (P).
///
/// Both slices are `width * height` long. The result is clamped to `[0, 1]`.
pub fn guided_filter(
    guide: &[f32],
    input: &[f32],
    width: usize,
    height: usize,
    radius: usize,
    eps: f32,
) -> Vec<f32> {
    debug_assert_eq!(guide.len(), input.len());
    let n = guide.len();
    let box_mean = |src: &[f32]| box_blur(src, width, height, radius);

    let mean_i = box_mean(guide);
    let mean_p = box_mean(input);

    let ip: Vec<f32> = guide.iter().zip(input).map(|(i, p)| i * p).collect();
    let ii: Vec<f32> = guide.iter().map(|i| i * i).collect();
    let mean_ip = box_mean(&ip);
    let mean_ii = box_mean(&ii);

    let mut a = vec![0.0f32; n];
    let mut b = vec![0.0f32; n];
    for k in 0..n {
        let cov_ip = mean_ip[k] - mean_i[k] * mean_p[k];
        let var_i = mean_ii[k] - mean_i[k] * mean_i[k];
        let denom = var_i + eps;
        a[k] = if denom > 0.0 { cov_ip / denom } else { 0.0 };
        b[k] = mean_p[k] - a[k] * mean_i[k];
    }

    let mean_a = box_mean(&a);
    let mean_b = box_mean(&b);

    (0..n)
        .map(|k| clamp01(mean_a[k] * guide[k] + mean_b[k]))
        .collect()
}

/// Guided smoothing as a pipeline stage, guided by the source luminance.
#[derive(Debug, Clone, Copy)]
pub struct GuidedSmooth {
    /// Box radius in pixels. Must be non-zero; a zero radius is never staged.
    pub radius: usize,
    /// Regularizer.
    pub eps: f32,
}

impl FieldStage for GuidedSmooth {
    fn id(&self) -> &'static str {
        "guided_filter"
    }

    fn kind(&self) -> StageKind {
        StageKind::Smooth
    }

    fn apply(&self, guide: &LinearLuminance, field: Vec<f32>) -> Vec<f32> {
        let (w, h) = guide.dims();
        guided_filter(guide.as_slice(), &field, w, h, self.radius, self.eps)
    }
}
