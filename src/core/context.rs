//! Depth session.
//!
//! A session owns everything one depth view needs: the cached luminance of
//! the loaded image, the current parameters, the output surface and the
//! repaint scheduler. It replaces ambient module state with an explicit
//! object the host drives through `&mut self`.

use crate::core::config::PipelineConfig;
use crate::core::error::{DepthError, DepthResult, SessionId};
use crate::core::types::{FilterParameters, LinearLuminance, RasterBuffer};
use crate::execution::engine::{DepthPipeline, RenderStats};
use crate::execution::scheduler::RepaintScheduler;
use crate::io;
use crate::metadata::settings::{read_settings, write_settings};
use std::path::Path;
use std::time::Instant;

/// Stem used for export names when the source has none.
const FALLBACK_STEM: &str = "depth";

/// A loaded image, its parameters and its rendered depth view.
#[derive(Debug)]
pub struct DepthSession {
    id: SessionId,
    pipeline: DepthPipeline,
    scheduler: RepaintScheduler,
    params: FilterParameters,
    source_name: Option<String>,
    luminance: Option<LinearLuminance>,
    output: Option<RasterBuffer>,
    last_stats: Option<RenderStats>,
}

impl DepthSession {
    /// Create an empty session.
    pub fn new(config: PipelineConfig) -> Self {
        let scheduler = RepaintScheduler::new(config.refresh_interval());
        Self {
            id: SessionId::new(),
            pipeline: DepthPipeline::new(config),
            scheduler,
            params: FilterParameters::default(),
            source_name: None,
            luminance: None,
            output: None,
            last_stats: None,
        }
    }

    /// Session identifier, for log correlation.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Active pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    /// Current parameters.
    pub fn params(&self) -> FilterParameters {
        self.params
    }

    /// Name of the loaded source, if any. Holds the full file name, extension included.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// True once an image is loaded.
    pub fn has_image(&self) -> bool {
        self.luminance.is_some()
    }

    /// Cached luminance of the loaded image.
    pub fn luminance(&self) -> Option<&LinearLuminance> {
        self.luminance.as_ref()
    }

    /// The repaint scheduler.
    pub fn scheduler(&self) -> &RepaintScheduler {
        &self.scheduler
    }

    /// Most recent render output. Stale until the next pass after a change.
    pub fn output(&self) -> Option<&RasterBuffer> {
        self.output.as_ref()
    }

    /// Statistics from the most recent pass.
    pub fn last_stats(&self) -> Option<&RenderStats> {
        self.last_stats.as_ref()
    }

    /// Load a decoded image. Replaces any previous image and queues a render.
    pub fn load_image(&mut self, image: &RasterBuffer, name: impl Into<String>) {
        let name = name.into();
        log::info!(
            "[{}] loaded '{}' ({}x{})",
            self.id,
            name,
            image.width(),
            image.height()
        );
        self.luminance = Some(LinearLuminance::from_rgba(image));
        self.output = Some(RasterBuffer::new(image.width(), image.height()));
        self.source_name = Some(name);
        self.last_stats = None;
        self.invalidate();
    }

    /// Load an encoded image.
    ///
    /// Settings stamped into a PNG are restored before the first render and
    /// returned. Corrupt or absent settings leave the current parameters alone.
    pub fn load_bytes(
        &mut self,
        bytes: &[u8],
        name: impl Into<String>,
    ) -> DepthResult<Option<FilterParameters>> {
        let image = io::decode_raster(bytes)?;
        let restored = read_settings(bytes);
        if let Some(params) = restored {
            log::info!("[{}] restored embedded settings", self.id);
            self.params = params;
        }
        self.load_image(&image, name);
        Ok(restored)
    }

    /// Load an image file. See [`DepthSession::load_bytes`].
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> DepthResult<Option<FilterParameters>> {
        let path = path.as_ref();
        let bytes = io::read_file(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_STEM.to_string());
        self.load_bytes(&bytes, name)
    }

    /// Drop the loaded image and any pending work.
    pub fn unload(&mut self) {
        self.scheduler.cancel();
        self.luminance = None;
        self.output = None;
        self.source_name = None;
        self.last_stats = None;
    }

    /// Replace the parameters and queue a render.
    pub fn set_params(&mut self, params: FilterParameters) {
        self.params = params;
        self.invalidate();
    }

    /// Edit the parameters in place and queue a render.
    pub fn update_params(&mut self, edit: impl FnOnce(FilterParameters) -> FilterParameters) {
        self.set_params(edit(self.params));
    }

    /// Restore default parameters and queue a render.
    pub fn reset_params(&mut self) {
        self.set_params(FilterParameters::default());
    }

    /// Mark the output stale. Returns true if this queued a new pass.
    pub fn invalidate(&mut self) -> bool {
        self.scheduler.invalidate(self.has_image())
    }

    /// Refresh-boundary hook: runs the queued pass if one is due.
    ///
    /// Returns the fresh output when a pass ran, `None` otherwise.
    pub fn poll_refresh(&mut self, now: Instant) -> DepthResult<Option<&RasterBuffer>> {
        if !self.scheduler.poll(now) || !self.scheduler.begin_pass(now) {
            return Ok(None);
        }
        let result = self.render_pass();
        self.scheduler.finish_pass();
        result?;
        Ok(self.output.as_ref())
    }

    /// Render immediately, outside the refresh cadence.
    ///
    /// A queued pass is consumed by this render.
    pub fn render_now(&mut self) -> DepthResult<&RasterBuffer> {
        let began = self.scheduler.begin_pass(Instant::now());
        let result = self.render_pass();
        if began {
            self.scheduler.finish_pass();
        }
        result?;
        self.output.as_ref().ok_or(DepthError::NoImage(self.id))
    }

    fn render_pass(&mut self) -> DepthResult<()> {
        let (Some(luma), Some(out)) = (self.luminance.as_ref(), self.output.as_mut()) else {
            return Err(DepthError::NoImage(self.id));
        };
        let params = self.params;
        let stats = self.pipeline.render_into(luma, &params, out)?;
        log::debug!("[{}] pass finished in {:?}", self.id, stats.total_duration);
        self.last_stats = Some(stats);
        Ok(())
    }

    /// Render and encode the depth view as PNG with the current settings stamped in.
    pub fn export_png(&mut self) -> DepthResult<Vec<u8>> {
        let params = self.params;
        let encoded = io::encode_png(self.render_now()?)?;
        let stamped = write_settings(&encoded, &params)?;
        log::info!(
            "[{}] exported {} ({} bytes)",
            self.id,
            self.suggested_export_name(),
            stamped.len()
        );
        Ok(stamped)
    }

    /// File name for an export: `<source stem>_depth.png`.
    ///
    /// Only the last extension is stripped, so `portrait.v2.png` gives
    /// `portrait.v2_depth.png`.
    pub fn suggested_export_name(&self) -> String {
        let stem = self
            .source_name
            .as_deref()
            .and_then(|name| io::source_stem(name))
            .unwrap_or_else(|| FALLBACK_STEM.to_string());
        format!("{}_depth.png", stem)
    }
}

impl Default for DepthSession {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::time::Duration;

    fn gradient(w: u32, h: u32) -> RasterBuffer {
        RasterBuffer::from_fn(w, h, |x, y| Rgba([(x * 20) as u8, (y * 20) as u8, 90, 255]))
    }

    #[test]
    fn test_empty_session_has_nothing_to_render() {
        let mut session = DepthSession::default();
        assert!(!session.invalidate());
        assert!(session.poll_refresh(Instant::now()).unwrap().is_none());
        assert!(matches!(session.render_now(), Err(DepthError::NoImage(_))));
        assert!(session.export_png().is_err());
    }

    #[test]
    fn test_load_then_poll_renders_once() {
        let mut session = DepthSession::default();
        session.load_image(&gradient(8, 6), "photo.jpg");

        let now = Instant::now();
        let out = session.poll_refresh(now).unwrap().expect("pass due after load");
        assert_eq!(out.dimensions(), (8, 6));
        assert!(session.poll_refresh(now).unwrap().is_none());
        assert!(session.last_stats().is_some());
    }

    #[test]
    fn test_slider_burst_coalesces() {
        let config = PipelineConfig::default().with_refresh_interval_ms(0);
        let mut session = DepthSession::new(config);
        session.load_image(&gradient(8, 8), "a");

        for i in 0..20 {
            session.update_params(|p| p.with_bias(i as f32 / 20.0));
        }
        assert!(session.poll_refresh(Instant::now()).unwrap().is_some());
        assert!(session.poll_refresh(Instant::now() + Duration::from_millis(1)).unwrap().is_none());
        assert_eq!(session.scheduler().stats().completed, 1);
        assert_eq!(session.params().bias, 19.0 / 20.0);
    }

    #[test]
    fn test_render_now_matches_pipeline() {
        let img = gradient(10, 10);
        let mut session = DepthSession::default();
        session.load_image(&img, "a");
        let params = FilterParameters::default().with_smooth_radius(2);
        session.set_params(params);

        let expected = DepthPipeline::default().render(&LinearLuminance::from_rgba(&img), &params);
        assert_eq!(session.render_now().unwrap(), &expected);
        assert!(!session.scheduler().is_pending());
    }

    #[test]
    fn test_export_restores_on_load() {
        let params = FilterParameters::default()
            .with_bias(0.25)
            .with_contrast(0.5)
            .with_edge_amount(0.75)
            .with_smooth_radius(3)
            .with_invert(true);

        let mut first = DepthSession::default();
        first.load_image(&gradient(12, 9), "portrait.png");
        first.set_params(params);
        let exported = first.export_png().unwrap();

        let mut second = DepthSession::default();
        let restored = second.load_bytes(&exported, "portrait_depth").unwrap();
        assert_eq!(restored, Some(params));
        assert_eq!(second.params(), params);
        assert_eq!(second.output().unwrap().dimensions(), (12, 9));
    }

    #[test]
    fn test_load_plain_png_keeps_params() {
        let png = io::encode_png(&gradient(4, 4)).unwrap();
        let mut session = DepthSession::default();
        session.set_params(FilterParameters::default().with_bias(0.125));
        assert_eq!(session.load_bytes(&png, "plain").unwrap(), None);
        assert_eq!(session.params().bias, 0.125);
    }

    #[test]
    fn test_reset_and_unload() {
        let mut session = DepthSession::default();
        session.load_image(&gradient(4, 4), "a");
        session.set_params(FilterParameters::default().with_invert(true));
        session.reset_params();
        assert_eq!(session.params(), FilterParameters::default());

        session.unload();
        assert!(!session.has_image());
        assert!(!session.scheduler().is_pending());
    }

    #[test]
    fn test_export_name() {
        let mut session = DepthSession::default();
        assert_eq!(session.suggested_export_name(), "depth_depth.png");
        session.load_image(&gradient(2, 2), "holiday.jpeg");
        assert_eq!(session.suggested_export_name(), "holiday_depth.png");
    }

    #[test]
    fn test_export_name_keeps_inner_dots_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("portrait.v2.png");
        io::write_file(&path, &io::encode_png(&gradient(3, 3)).unwrap()).unwrap();

        let mut session = DepthSession::default();
        session.load_path(&path).unwrap();
        assert_eq!(session.source_name(), Some("portrait.v2.png"));
        assert_eq!(session.suggested_export_name(), "portrait.v2_depth.png");
    }
}
