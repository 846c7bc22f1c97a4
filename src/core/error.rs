//! Error types for softdepth.
//!
//! Uses thiserror for structured errors with context. Most failure modes in
//! the pipeline and the metadata codec are recovered locally (they yield
//! `None`, defaults, or the input unchanged), so these errors only surface at
//! the I/O, configuration and surface-allocation boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a depth session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a session ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for softdepth.
#[derive(Error, Debug)]
pub enum DepthError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config value '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Buffer length {got} does not match {width}x{height}")]
    BufferLength { width: u32, height: u32, got: usize },

    #[error("No image loaded in session {0}")]
    NoImage(SessionId),
}

impl DepthError {
    /// Check if this error came from the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DepthError::DimensionMismatch { .. }
                | DepthError::BufferLength { .. }
                | DepthError::InvalidConfig { .. }
                | DepthError::ConfigParse(_)
                | DepthError::NoImage(_)
        )
    }
}

/// Result type alias for softdepth operations.
pub type DepthResult<T> = Result<T, DepthError>;
