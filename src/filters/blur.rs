//! Separable running-sum box average.
//!
//! The shared smoothing primitive of the guided filter. Borders replicate the
//! edge sample instead of zero-padding, so averages near the frame do not
//! darken. Cost is linear in the pixel count for every radius.

/// Average `src` over a `(2r+1) x (2r+1)` window, horizontal pass then vertical.
///
/// `r == 0` returns an exact copy of the input.
pub fn box_blur(src: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), width * height);
    if radius == 0 || src.is_empty() {
        return src.to_vec();
    }

    let mut tmp = vec![0.0f32; src.len()];
    let mut dst = vec![0.0f32; src.len()];
    let inv = 1.0 / (2 * radius + 1) as f64;

    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let out = &mut tmp[y * width..(y + 1) * width];
        running_average(width, radius, inv, |i| row[i], |i, v| out[i] = v);
    }

    for x in 0..width {
        running_average(
            height,
            radius,
            inv,
            |i| tmp[i * width + x],
            |i, v| dst[i * width + x] = v,
        );
    }

    dst
}

/// One 1-D pass over `len` samples with clamp-to-edge indexing.
#[inline]
fn running_average(
    len: usize,
    radius: usize,
    inv: f64,
    read: impl Fn(usize) -> f32,
    mut write: impl FnMut(usize, f32),
) {
    let last = len - 1;
    let r = radius as isize;
    let clamp = |i: isize| i.clamp(0, last as isize) as usize;

    // Initial window [-r, r]: r replicas of the first sample, the in-range
    // taps, then replicas of the last sample for any overhang.
    let in_range = radius.min(last);
    let mut acc = radius as f64 * read(0) as f64
        + (0..=in_range).map(|i| read(i) as f64).sum::<f64>()
        + (radius - in_range) as f64 * read(last) as f64;
    for i in 0..len {
        write(i, (acc * inv) as f32);
        let add = clamp(i as isize + r + 1);
        let sub = clamp(i as isize - r);
        acc += read(add) as f64 - read(sub) as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_radius_zero_is_identity() {
        let src: Vec<f32> = (0..12).map(|i| i as f32 * 0.37).collect();
        assert_eq!(box_blur(&src, 4, 3, 0), src);
    }

    #[test]
    fn test_constant_field_is_unchanged() {
        let src = vec![0.42f32; 7 * 5];
        for r in 1..6 {
            for v in box_blur(&src, 7, 5, r) {
                assert!((v - 0.42).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_edges_replicate_instead_of_darkening() {
        // Left half 1.0, right half 0.0. Zero padding would pull the
        // top-left corner below 1.
        let (w, h) = (6, 4);
        let src: Vec<f32> = (0..w * h).map(|i| if i % w < 3 { 1.0 } else { 0.0 }).collect();
        let out = box_blur(&src, w, h, 1);
        assert!((out[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_impulse_spreads_evenly() {
        let (w, h) = (5, 5);
        let mut src = vec![0.0f32; w * h];
        src[2 * w + 2] = 9.0;
        let out = box_blur(&src, w, h, 1);
        for y in 1..4 {
            for x in 1..4 {
                assert!((out[y * w + x] - 1.0).abs() < 1e-5);
            }
        }
        assert!(out[0].abs() < 1e-6);
    }

    fn clamped_box_reference(src: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
        let r = radius as isize;
        let at = |x: isize, y: isize| {
            let x = x.clamp(0, width as isize - 1) as usize;
            let y = y.clamp(0, height as isize - 1) as usize;
            src[y * width + x] as f64
        };
        let mut out = Vec::with_capacity(src.len());
        for y in 0..height as isize {
            for x in 0..width as isize {
                let mut sum = 0.0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        sum += at(x + dx, y + dy);
                    }
                }
                out.push((sum / ((2 * r + 1) * (2 * r + 1)) as f64) as f32);
            }
        }
        out
    }

    #[test]
    fn test_matches_clamped_window_reference() {
        let (w, h) = (5, 3);
        let src: Vec<f32> = (0..w * h).map(|i| ((i * 7) % 11) as f32 / 10.0).collect();
        for r in 0..9 {
            let fast = box_blur(&src, w, h, r);
            let slow = clamped_box_reference(&src, w, h, r);
            for (a, b) in fast.iter().zip(&slow) {
                assert!((a - b).abs() < 1e-5, "r={} fast={} slow={}", r, a, b);
            }
        }
    }

    #[test]
    fn test_huge_radius_is_cheap_and_bounded() {
        let src: Vec<f32> = (0..16).map(|i| i as f32 / 15.0).collect();
        let out = box_blur(&src, 4, 4, 1 << 30);
        for v in out {
            assert!(v.is_finite() && (-1e-4..=1.0 + 1e-4).contains(&v));
        }
    }

    #[test]
    fn test_radius_larger_than_image() {
        let src = vec![0.0, 1.0, 0.0, 1.0];
        let out = box_blur(&src, 2, 2, 10);
        assert_eq!(out.len(), 4);
        for v in out {
            assert!(v.is_finite() && (0.0..=1.0).contains(&v));
        }
    }

    proptest! {
        #[test]
        fn prop_output_within_input_range(
            data in proptest::collection::vec(0.0f32..1.0, 1..64),
            radius in 0usize..5,
        ) {
            let width = data.len();
            let out = box_blur(&data, width, 1, radius);
            let lo = data.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            for v in out {
                prop_assert!(v >= lo - 1e-5 && v <= hi + 1e-5);
            }
        }
    }
}
