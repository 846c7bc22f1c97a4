//! File and codec boundary.
//!
//! Blocking std I/O plus `image` encode/decode. Everything past this module
//! works on in-memory buffers.

use crate::core::error::DepthResult;
use crate::core::types::RasterBuffer;
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Read a whole file.
pub fn read_file(path: impl AsRef<Path>) -> DepthResult<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Write a whole file, replacing any existing one.
pub fn write_file(path: impl AsRef<Path>, bytes: &[u8]) -> DepthResult<()> {
    Ok(fs::write(path, bytes)?)
}

/// Decode any supported image format to 8-bit RGBA.
pub fn decode_raster(bytes: &[u8]) -> DepthResult<RasterBuffer> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Load and decode an image file.
pub fn load_raster(path: impl AsRef<Path>) -> DepthResult<RasterBuffer> {
    decode_raster(&read_file(path)?)
}

/// Encode a raster as PNG.
pub fn encode_png(raster: &RasterBuffer) -> DepthResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    raster.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

/// File name without directory or extension, if there is one.
pub fn source_stem(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}
