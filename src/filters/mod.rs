//! Filter module.
//!
//! Numeric building blocks of the depth pipeline and the stages built on them.

pub mod blur;
pub mod color;
pub mod edges;
pub mod guided;
pub mod normalize;
pub mod tone;

pub use edges::EdgeBlend;
pub use guided::GuidedSmooth;
pub use normalize::PercentileNormalize;

use crate::core::config::PipelineConfig;
use crate::core::stage::FieldStage;
use crate::core::types::FilterParameters;

/// Build the ordered stage list for one render pass.
///
/// Normalization always runs. Guided smoothing is staged only for a non-zero
/// radius, and the edge blend only above the configured threshold.
pub fn stages_for(params: &FilterParameters, config: &PipelineConfig) -> Vec<Box<dyn FieldStage>> {
    let mut stages: Vec<Box<dyn FieldStage>> = vec![Box::new(PercentileNormalize {
        low: config.low_percentile,
        high: config.high_percentile,
        max_samples: config.max_samples,
    })];

    if params.smooth_radius > 0 {
        stages.push(Box::new(GuidedSmooth {
            radius: params.smooth_radius as usize,
            eps: config.guided_eps,
        }));
    }

    if params.edge_amount > config.edge_threshold {
        stages.push(Box::new(EdgeBlend {
            amount: params.edge_amount,
            ceiling: config.edge_weight,
        }));
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::StageKind;

    #[test]
    fn test_default_params_only_normalize() {
        let stages = stages_for(&FilterParameters::default(), &PipelineConfig::default());
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].id(), "percentile_normalize");
    }

    #[test]
    fn test_full_plan_order() {
        let params = FilterParameters::default()
            .with_smooth_radius(3)
            .with_edge_amount(0.5);
        let kinds: Vec<StageKind> = stages_for(&params, &PipelineConfig::default())
            .iter()
            .map(|s| s.kind())
            .collect();
        assert_eq!(kinds, vec![StageKind::Normalize, StageKind::Smooth, StageKind::Edge]);
    }

    #[test]
    fn test_edge_below_threshold_is_skipped() {
        let params = FilterParameters::default().with_edge_amount(0.0005);
        assert_eq!(stages_for(&params, &PipelineConfig::default()).len(), 1);
    }
}
