//! Canvas normalization for images of different sizes.

use image::{imageops, RgbaImage};

/// Places `baseline` and `current` at the origin of two transparent canvases
/// sized to the larger of each dimension.
///
/// Source pixels are copied verbatim (no blending, no resampling). Any area
/// outside a source stays `[0, 0, 0, 0]`, so a region present in only one of
/// the images shows up as changed pixels rather than being cropped away.
pub fn normalize(baseline: &RgbaImage, current: &RgbaImage) -> (RgbaImage, RgbaImage) {
  let width = baseline.width().max(current.width());
  let height = baseline.height().max(current.height());

  if baseline.dimensions() == (width, height) && current.dimensions() == (width, height) {
    return (baseline.clone(), current.clone());
  }

  log::debug!(
    "padding {}x{} and {}x{} to {}x{}",
    baseline.width(),
    baseline.height(),
    current.width(),
    current.height(),
    width,
    height
  );
  (pad(baseline, width, height), pad(current, width, height))
}

fn pad(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
  let mut canvas = RgbaImage::new(width, height);
  imageops::replace(&mut canvas, source, 0, 0);
  canvas
}
