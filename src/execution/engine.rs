//! Depth render engine.
//!
//! Runs the staged field computation and the tone composer for one pass.
//! A pass is a pure function of the luminance and the parameters; the only
//! side effect is writing the caller's output surface.

use crate::core::config::PipelineConfig;
use crate::core::error::{DepthError, DepthResult};
use crate::core::stage::StageKind;
use crate::core::types::{FilterParameters, LinearLuminance, RasterBuffer};
use crate::filters::{stages_for, tone};
use std::time::{Duration, Instant};

/// Timing for one stage of a pass.
#[derive(Debug, Clone)]
pub struct StageTiming {
    /// Stage identifier.
    pub id: &'static str,
    /// Stage category.
    pub kind: StageKind,
    /// Wall time spent in the stage.
    pub duration: Duration,
}

/// Statistics from a render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Total pass time, including tone composition.
    pub total_duration: Duration,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageTiming>,
    /// Number of pixels written.
    pub pixels: usize,
}

impl RenderStats {
    /// Check whether a stage of the given kind ran.
    pub fn ran(&self, kind: StageKind) -> bool {
        self.stages.iter().any(|s| s.kind == kind)
    }
}

/// The depth pipeline.
#[derive(Debug, Clone, Default)]
pub struct DepthPipeline {
    config: PipelineConfig,
}

impl DepthPipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compute the working depth field (before the tone curve).
    pub fn depth_field(&self, luma: &LinearLuminance, params: &FilterParameters) -> Vec<f32> {
        self.depth_field_with_stats(luma, params, &mut RenderStats::default())
    }

    fn depth_field_with_stats(
        &self,
        luma: &LinearLuminance,
        params: &FilterParameters,
        stats: &mut RenderStats,
    ) -> Vec<f32> {
        let mut field = Vec::new();
        for stage in stages_for(params, &self.config) {
            let start = Instant::now();
            field = stage.apply(luma, field);
            let duration = start.elapsed();
            debug_assert_eq!(field.len(), luma.len());
            log::trace!("stage {} ({}) took {:?}", stage.id(), stage.kind(), duration);
            stats.stages.push(StageTiming {
                id: stage.id(),
                kind: stage.kind(),
                duration,
            });
        }
        field
    }

    /// Render into a caller-owned surface of the same size as `luma`.
    pub fn render_into(
        &self,
        luma: &LinearLuminance,
        params: &FilterParameters,
        out: &mut RasterBuffer,
    ) -> DepthResult<RenderStats> {
        if out.dimensions() != (luma.width(), luma.height()) {
            return Err(DepthError::DimensionMismatch {
                expected_width: luma.width(),
                expected_height: luma.height(),
                width: out.width(),
                height: out.height(),
            });
        }

        let start = Instant::now();
        let mut stats = RenderStats::default();
        let field = self.depth_field_with_stats(luma, params, &mut stats);
        tone::compose_into(&field, params, out);

        stats.pixels = field.len();
        stats.total_duration = start.elapsed();
        log::debug!(
            "rendered {}x{} depth in {:?} ({} stages)",
            luma.width(),
            luma.height(),
            stats.total_duration,
            stats.stages.len()
        );
        Ok(stats)
    }

    /// Render into a freshly allocated raster.
    pub fn render(&self, luma: &LinearLuminance, params: &FilterParameters) -> RasterBuffer {
        let mut out = RasterBuffer::new(luma.width(), luma.height());
        let field = self.depth_field(luma, params);
        tone::compose_into(&field, params, &mut out);
        out
    }
}

/// Render with the default configuration.
pub fn render_depth(luma: &LinearLuminance, params: &FilterParameters) -> RasterBuffer {
    DepthPipeline::default().render(luma, params)
}
