//! Core types and traits for the softdepth pipeline.
//!
//! This module contains the foundational pieces shared by the filters, the
//! engine and the metadata codec:
//! - Value types (luminance cache, filter parameters)
//! - The field stage trait
//! - Pipeline configuration
//! - Error types
//! - The session context

pub mod config;
pub mod context;
pub mod error;
pub mod stage;
pub mod types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use context::DepthSession;
pub use error::{DepthError, DepthResult, SessionId};
pub use stage::{FieldStage, StageKind};
pub use types::{FilterParameters, LinearLuminance, RasterBuffer};
