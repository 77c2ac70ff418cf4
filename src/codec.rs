//! PNG decoding/encoding and artifact loading.
//!
//! The comparison pipeline only ever sees [`RgbaImage`] buffers. How those
//! buffers get to and from bytes is behind [`ImageCodec`] so tests can swap
//! in a deterministic codec without touching real PNG data.

use crate::error::{ArtifactError, CodecError, Result};
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

/// Decode/encode capability for raster artifacts.
pub trait ImageCodec {
  /// Decodes raw bytes into an 8-bit RGBA buffer without any color-space conversion.
  fn decode(&self, data: &[u8]) -> std::result::Result<RgbaImage, CodecError>;

  /// Encodes an RGBA buffer losslessly.
  fn encode(&self, image: &RgbaImage) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Lossless PNG codec backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
  fn decode(&self, data: &[u8]) -> std::result::Result<RgbaImage, CodecError> {
    image::load_from_memory_with_format(data, ImageFormat::Png)
      .map(|img| img.to_rgba8())
      .map_err(|e| CodecError::DecodeFailed {
        format: "PNG".to_string(),
        reason: e.to_string(),
      })
  }

  fn encode(&self, image: &RgbaImage) -> std::result::Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
      .map_err(|e| CodecError::EncodeFailed {
        format: "PNG".to_string(),
        reason: e.to_string(),
      })?;
    Ok(buffer)
  }
}

/// Reads and decodes the image stored at `path`.
///
/// Fails with [`ArtifactError::NotFound`] when nothing exists at `path` and
/// with [`ArtifactError::Decode`] when the bytes are not a valid image.
pub fn load_image(codec: &dyn ImageCodec, path: &Path) -> Result<RgbaImage> {
  let data = fs::read(path).map_err(|e| match e.kind() {
    ErrorKind::NotFound => ArtifactError::NotFound {
      path: path.display().to_string(),
    },
    _ => ArtifactError::Read {
      path: path.display().to_string(),
      reason: e.to_string(),
    },
  })?;

  let image = codec
    .decode(&data)
    .map_err(|source| ArtifactError::Decode {
      path: path.display().to_string(),
      source,
    })?;
  log::debug!(
    "loaded {} ({}x{})",
    path.display(),
    image.width(),
    image.height()
  );
  Ok(image)
}

/// Encodes `image` and writes it to `path`, replacing any previous file.
pub fn save_image(codec: &dyn ImageCodec, image: &RgbaImage, path: &Path) -> Result<()> {
  let bytes = codec.encode(image).map_err(|e| ArtifactError::Write {
    path: path.display().to_string(),
    reason: e.to_string(),
  })?;
  fs::write(path, bytes).map_err(|e| ArtifactError::Write {
    path: path.display().to_string(),
    reason: e.to_string(),
  })?;
  Ok(())
}
