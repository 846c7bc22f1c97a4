//! # Softdepth - Luminance-driven Depth Maps
//!
//! Softdepth turns an ordinary photo into a grayscale pseudo depth map: bright
//! means near, dark means far. It also stamps the settings that produced a map
//! into the exported PNG, so reopening the file restores them.
//!
//! ## Features
//!
//! - **Gamma-correct pipeline**: all math runs in linear light, sRGB only at the edges
//! - **Edge-aware smoothing**: a guided filter steered by the image's own luminance
//! - **Staged rendering**: normalize, smooth and edge stages behind the `FieldStage` trait
//! - **Coalesced repaints**: bursts of parameter edits collapse into one pass
//! - **Lossless metadata**: JSON records spliced into PNG `tEXt` chunks, pixels untouched
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use softdepth::prelude::*;
//!
//! let image = softdepth::io::load_raster("portrait.jpg")?;
//! let luma = LinearLuminance::from_rgba(&image);
//!
//! let params = FilterParameters::default()
//!     .with_contrast(0.6)
//!     .with_smooth_radius(4)
//!     .with_edge_amount(0.3);
//! let depth = render_depth(&luma, &params);
//! ```
//!
//! Interactive hosts drive a [`DepthSession`](core::DepthSession) instead:
//!
//! ```rust,ignore
//! let mut session = DepthSession::new(PipelineConfig::default());
//! session.load_path("portrait.png")?;      // restores stamped settings
//! session.update_params(|p| p.with_bias(0.4));
//! if let Some(frame) = session.poll_refresh(Instant::now())? {
//!     // present frame
//! }
//! let png = session.export_png()?;         // settings embedded
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Value types, configuration, errors, the stage trait and the session
//! - [`filters`]: Color transfer, box blur, percentile normalization, guided filter, Sobel, tone curve
//! - [`execution`]: The render engine and the repaint scheduler
//! - [`metadata`]: PNG chunk codec, settings and pose records
//! - [`io`]: File and image codec boundary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod filters;
pub mod io;
pub mod metadata;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use softdepth::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{FilterParameters, LinearLuminance, RasterBuffer};

    // Configuration and session
    pub use crate::core::config::PipelineConfig;
    pub use crate::core::context::DepthSession;

    // Stages
    pub use crate::core::stage::{FieldStage, StageKind};
    pub use crate::filters::{stages_for, EdgeBlend, GuidedSmooth, PercentileNormalize};

    // Errors
    pub use crate::core::error::{DepthError, DepthResult, SessionId};

    // Execution
    pub use crate::execution::engine::{render_depth, DepthPipeline, RenderStats};
    pub use crate::execution::scheduler::{RenderState, RepaintScheduler};

    // Metadata
    pub use crate::metadata::png::{read_text_record, write_text_record};
    pub use crate::metadata::pose::{PosePayload, Skeleton, ViewOptions};
    pub use crate::metadata::settings::DepthSettings;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use image::Rgba;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "softdepth");
    }

    #[test]
    fn test_render_and_stamp_end_to_end() {
        let image = RasterBuffer::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 40, 255]));
        let luma = LinearLuminance::from_rgba(&image);
        let params = FilterParameters::default().with_smooth_radius(2).with_edge_amount(0.4);
        let depth = render_depth(&luma, &params);
        assert_eq!(depth.dimensions(), (16, 16));

        let png = crate::io::encode_png(&depth).unwrap();
        let json = DepthSettings::from_params(&params).to_json().unwrap();
        let stamped = write_text_record(&png, crate::metadata::SETTINGS_KEY, &json);

        assert_eq!(crate::io::decode_raster(&stamped).unwrap(), depth);
        assert_eq!(crate::metadata::read_settings(&stamped), Some(params));
        assert_eq!(
            read_text_record(&stamped, crate::metadata::SETTINGS_KEY).as_deref(),
            Some(json.as_str())
        );
    }
}
