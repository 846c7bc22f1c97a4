//! Final tone curve: bias, sigmoid contrast, optional inversion, sRGB encode.

use crate::core::types::FilterParameters;
use crate::filters::color::srgb_encode;
use crate::filters::normalize::clamp01;
use image::{Rgba, RgbaImage};

/// Sigmoid midpoint.
pub const SIGMOID_MID: f32 = 0.5;

/// Logistic curve `1 / (1 + e^(-k (v - mid)))`.
#[inline]
pub fn sigmoid(v: f32, k: f32, mid: f32) -> f32 {
    1.0 / (1.0 + (-k * (v - mid)).exp())
}

/// Sigmoid gain for a contrast setting: 2 at contrast 0, 10 at contrast 1.
#[inline]
pub fn sigmoid_gain(contrast: f32) -> f32 {
    2.0 + contrast * 8.0
}

/// Slope of the tone sigmoid at its midpoint, `k / 4`.
#[inline]
pub fn midpoint_slope(contrast: f32) -> f32 {
    sigmoid_gain(contrast) / 4.0
}

/// Map one field sample to its linear-light output level.
#[inline]
pub fn tone_value(field: f32, params: &FilterParameters) -> f32 {
    let v = clamp01(field + (params.bias - 0.5));
    let v = sigmoid(v, sigmoid_gain(params.contrast), SIGMOID_MID);
    let v = if params.invert { 1.0 - v } else { v };
    clamp01(v)
}

/// Write the toned field into `out` as opaque gray. Every pixel is rewritten.
pub fn compose_into(field: &[f32], params: &FilterParameters, out: &mut RgbaImage) {
    debug_assert_eq!(field.len(), out.width() as usize * out.height() as usize);
    for (px, &f) in out.pixels_mut().zip(field) {
        let g = srgb_encode(tone_value(f, params));
        *px = Rgba([g, g, g, 255]);
    }
}
