//! FieldStage trait and stage metadata.
//!
//! A depth render pass is a short chain of field-to-field stages followed by
//! the tone composer. Each stage sees the immutable luminance guide and the
//! working field, and returns the next working field.

use crate::core::types::LinearLuminance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a stage performs, for logs and timing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Contrast normalization.
    Normalize,
    /// Edge-preserving smoothing.
    Smooth,
    /// Edge emphasis.
    Edge,
}

impl StageKind {
    /// Get the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::Normalize => "Normalize",
            StageKind::Smooth => "Smooth",
            StageKind::Edge => "Edge",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One step of the depth field computation.
pub trait FieldStage: Send + Sync {
    /// Stable identifier, e.g. `"guided_filter"`.
    fn id(&self) -> &'static str;

    /// Stage category.
    fn kind(&self) -> StageKind;

    /// Produce the next working field from the current one.
    ///
    /// `field` has exactly `guide.len()` samples, and so must the result.
    fn apply(&self, guide: &LinearLuminance, field: Vec<f32>) -> Vec<f32>;
}

impl fmt::Debug for dyn FieldStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStage")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
