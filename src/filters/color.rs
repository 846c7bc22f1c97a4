//! sRGB transfer functions and linear-light luminance.

/// Rec.601 luma weights, applied in linear light.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Decode an sRGB-encoded value in `[0, 1]` to linear light.
#[inline]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Encode a linear-light value in `[0, 1]` with the sRGB curve.
#[inline]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Decode an 8-bit sRGB sample.
#[inline]
pub fn srgb_decode(byte: u8) -> f32 {
    srgb_to_linear(byte as f32 / 255.0)
}

/// Encode linear light to an 8-bit sRGB sample, rounding to nearest.
#[inline]
pub fn srgb_encode(v: f32) -> u8 {
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    (linear_to_srgb(v) * 255.0).round() as u8
}

/// Linear-light luminance of one RGBA pixel. Alpha is ignored.
#[inline]
pub fn linear_luma(px: [u8; 4]) -> f32 {
    LUMA_WEIGHTS[0] * srgb_decode(px[0])
        + LUMA_WEIGHTS[1] * srgb_decode(px[1])
        + LUMA_WEIGHTS[2] * srgb_decode(px[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(srgb_decode(0), 0.0);
        assert!((srgb_decode(255) - 1.0).abs() < 1e-6);
        assert_eq!(srgb_encode(0.0), 0);
        assert_eq!(srgb_encode(1.0), 255);
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for i in 0..=100 {
            let x = i as f32 / 100.0;
            let back = srgb_to_linear(linear_to_srgb(x));
            assert!((back - x).abs() < 1e-5, "x={} back={}", x, back);
        }
    }

    #[test]
    fn test_every_byte_survives_decode_encode() {
        for b in 0..=255u8 {
            assert_eq!(srgb_encode(srgb_decode(b)), b);
        }
    }

    #[test]
    fn test_mid_gray_is_darker_in_linear() {
        let linear = srgb_decode(128);
        assert!((linear - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn test_luma_weights_sum_to_one() {
        let sum: f32 = LUMA_WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!((linear_luma([255, 255, 255, 0]) - 1.0).abs() < 1e-5);
    }
}
