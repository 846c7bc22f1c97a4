//! Core value types that flow through the depth pipeline.
//!
//! The source raster is a plain `image::RgbaImage`. Everything derived from it
//! is a flat `f32` field in row-major order, tagged with its dimensions by
//! [`LinearLuminance`] and addressed by index everywhere else.

use crate::core::error::{DepthError, DepthResult};
use crate::filters::color;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Caller-owned 8-bit RGBA raster. Read-only pipeline input and output surface.
pub type RasterBuffer = RgbaImage;

/// Per-pixel luminance in linear light, one float per pixel in `[0, 1]`.
///
/// Built once per loaded image and shared through an `Arc`, so a session can
/// hand it to every render pass without copying. It is never mutated in place;
/// loading a new image replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearLuminance {
    width: u32,
    height: u32,
    data: Arc<[f32]>,
}

impl LinearLuminance {
    /// Extract Rec.601 luminance from an sRGB raster, decoding each channel to linear first.
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let data: Vec<f32> = image.pixels().map(|px| color::linear_luma(px.0)).collect();
        Self {
            width: image.width(),
            height: image.height(),
            data: data.into(),
        }
    }

    /// Wrap an existing luminance buffer. The length must equal `width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> DepthResult<Self> {
        if data.len() != width as usize * height as usize {
            return Err(DepthError::BufferLength {
                width,
                height,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: data.into(),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as `usize`, the form the field filters take.
    pub fn dims(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-area image.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw samples in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Tone and filter controls for one render pass.
///
/// A plain value object: a pass copies it at start and never observes later
/// edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Brightness offset around the midpoint, `[0, 1]`, 0.5 is neutral.
    pub bias: f32,
    /// Sigmoid steepness control, `[0, 1]`.
    pub contrast: f32,
    /// Weight of the edge field blended into the depth estimate, `[0, 1]`.
    pub edge_amount: f32,
    /// Guided filter radius in pixels. Zero bypasses smoothing.
    pub smooth_radius: u32,
    /// Swap near and far.
    pub invert: bool,
}

impl FilterParameters {
    /// Neutral bias.
    pub const DEFAULT_BIAS: f32 = 0.5;
    /// Full contrast.
    pub const DEFAULT_CONTRAST: f32 = 1.0;

    /// Create parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bias, clamped to `[0, 1]`.
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = clamp_unit(bias, Self::DEFAULT_BIAS);
        self
    }

    /// Set contrast, clamped to `[0, 1]`.
    pub fn with_contrast(mut self, contrast: f32) -> Self {
        self.contrast = clamp_unit(contrast, Self::DEFAULT_CONTRAST);
        self
    }

    /// Set edge amount, clamped to `[0, 1]`.
    pub fn with_edge_amount(mut self, edge_amount: f32) -> Self {
        self.edge_amount = clamp_unit(edge_amount, 0.0);
        self
    }

    /// Set the guided filter radius.
    pub fn with_smooth_radius(mut self, radius: u32) -> Self {
        self.smooth_radius = radius;
        self
    }

    /// Set inversion.
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// The same parameters with `invert` flipped.
    pub fn inverted(self) -> Self {
        Self {
            invert: !self.invert,
            ..self
        }
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            bias: Self::DEFAULT_BIAS,
            contrast: Self::DEFAULT_CONTRAST,
            edge_amount: 0.0,
            smooth_radius: 0,
            invert: false,
        }
    }
}

/// Clamp to `[0, 1]`, substituting `fallback` for NaN and infinities.
pub(crate) fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}
