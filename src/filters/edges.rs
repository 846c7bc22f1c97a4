//! Sobel edge magnitude and the capped edge blend.

use crate::core::stage::{FieldStage, StageKind};
use crate::core::types::LinearLuminance;

/// Floor on the normalizing maximum, so a blank image yields zeros, not NaN.
pub const MAGNITUDE_FLOOR: f32 = 1e-6;

/// Normalized Sobel gradient magnitude of `src`.
///
/// Interior pixels get `sqrt(gx² + gy²)` divided by the field maximum; the
/// one-pixel border, and any image smaller than 3x3, stays zero.
pub fn sobel_magnitude(src: &[f32], width: usize, height: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), width * height);
    let mut dst = vec![0.0f32; src.len()];
    if width < 3 || height < 3 {
        return dst;
    }

    let at = |x: usize, y: usize| src[y * width + x];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let (tl, tc, tr) = (at(x - 1, y - 1), at(x, y - 1), at(x + 1, y - 1));
            let (ml, mr) = (at(x - 1, y), at(x + 1, y));
            let (bl, bc, br) = (at(x - 1, y + 1), at(x, y + 1), at(x + 1, y + 1));

            // Paired differences so a flat neighbourhood gives exactly zero.
            let gx = (tr - tl) + 2.0 * (mr - ml) + (br - bl);
            let gy = (bl - tl) + 2.0 * (bc - tc) + (br - tr);
            dst[y * width + x] = gx.hypot(gy);
        }
    }

    let max = dst.iter().copied().fold(MAGNITUDE_FLOOR, f32::max);
    let inv = 1.0 / max;
    for v in &mut dst {
        *v = (*v * inv).min(1.0);
    }
    dst
}

/// Blend weight for a given edge amount: `min(1, amount) * ceiling`.
#[inline]
pub fn edge_blend_weight(edge_amount: f32, ceiling: f32) -> f32 {
    edge_amount.clamp(0.0, 1.0) * ceiling
}

/// Linear mix `base * (1 - t) + edges * t`, written into `base`.
pub fn mix_into(base: &mut [f32], edges: &[f32], t: f32) {
    debug_assert_eq!(base.len(), edges.len());
    for (b, &e) in base.iter_mut().zip(edges) {
        *b = *b * (1.0 - t) + e * t;
    }
}

/// Edge emphasis as a pipeline stage. Gradients come from the source
/// luminance, never from the smoothed field.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBlend {
    /// Requested edge amount.
    pub amount: f32,
    /// Blend weight at `amount = 1`.
    pub ceiling: f32,
}

impl FieldStage for EdgeBlend {
    fn id(&self) -> &'static str {
        "edge_blend"
    }

    fn kind(&self) -> StageKind {
        StageKind::Edge
    }

    fn apply(&self, guide: &LinearLuminance, mut field: Vec<f32>) -> Vec<f32> {
        let (w, h) = guide.dims();
        let edges = sobel_magnitude(guide.as_slice(), w, h);
        mix_into(&mut field, &edges, edge_blend_weight(self.amount, self.ceiling));
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_image_has_no_edges() {
        let out = sobel_magnitude(&[0.7; 25], 5, 5);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_flat_values_prone_to_rounding_stay_zero() {
        for level in [0.1f32, 0.3, 0.7, 0.577_580_6, 0.999] {
            let out = sobel_magnitude(&[level; 64], 8, 8);
            assert!(out.iter().all(|&v| v == 0.0), "level={}", level);
        }
    }

    #[test]
    fn test_border_is_zero_and_peak_is_one() {
        let (w, h) = (6, 6);
        let src: Vec<f32> = (0..w * h).map(|i| if i % w < 3 { 0.0 } else { 1.0 }).collect();
        let out = sobel_magnitude(&src, w, h);

        for x in 0..w {
            assert_eq!(out[x], 0.0);
            assert_eq!(out[(h - 1) * w + x], 0.0);
        }
        for y in 0..h {
            assert_eq!(out[y * w], 0.0);
            assert_eq!(out[y * w + w - 1], 0.0);
        }
        let peak = out.iter().copied().fold(0.0, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!((out[2 * w + 2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tiny_images_are_all_zero() {
        assert_eq!(sobel_magnitude(&[0.0, 1.0, 1.0, 0.0], 2, 2), vec![0.0; 4]);
        assert!(sobel_magnitude(&[], 0, 0).is_empty());
    }

    #[test]
    fn test_blend_weight_is_capped() {
        assert_eq!(edge_blend_weight(0.0, 0.35), 0.0);
        assert!((edge_blend_weight(1.0, 0.35) - 0.35).abs() < 1e-7);
        assert!((edge_blend_weight(4.0, 0.35) - 0.35).abs() < 1e-7);
    }

    #[test]
    fn test_mix_never_replaces_base() {
        let mut base = vec![0.0f32, 1.0];
        mix_into(&mut base, &[1.0, 0.0], 0.35);
        assert!((base[0] - 0.35).abs() < 1e-6);
        assert!((base[1] - 0.65).abs() < 1e-6);
    }
}
