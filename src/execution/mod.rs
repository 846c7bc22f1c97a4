//! Execution module.
//!
//! The render engine and the repaint scheduler that decides when it runs.

pub mod engine;
pub mod scheduler;

pub use engine::{render_depth, DepthPipeline, RenderStats, StageTiming};
pub use scheduler::{RenderState, RepaintScheduler, SchedulerStats};
