//! Per-pixel perceptual image differencing.
//!
//! [`PerceptualDiffer`] classifies each pixel by its YIQ color distance,
//! optionally excluding anti-aliasing artifacts, and paints a diff image:
//! mismatches in a highlight color, anti-aliased pixels in a second color and
//! everything else as a faded grayscale copy of the baseline.

use crate::error::{ConfigError, DiffError, Result};
use image::{Rgba, RgbaImage};

/// Largest possible squared YIQ distance between two opaque colors.
const MAX_YIQ_DELTA: f64 = 35215.0;

/// Weight that maps a full 0..255 alpha change onto [`MAX_YIQ_DELTA`].
const ALPHA_WEIGHT: f64 = MAX_YIQ_DELTA / (255.0 * 255.0);

/// Configuration for classifying and visualizing pixel differences.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOptions {
  /// Perceptual sensitivity (0.0-1.0). Lower is stricter.
  pub threshold: f64,
  /// Whether anti-aliased pixels count as mismatches.
  pub include_aa: bool,
  /// Opacity of the baseline shown under the diff (0.0-1.0).
  pub alpha: f64,
  /// Color used for pixels detected as anti-aliasing.
  pub aa_color: [u8; 3],
  /// Color used for mismatched pixels.
  pub diff_color: [u8; 3],
  /// Color for mismatched pixels that are darker in the current image.
  pub diff_color_alt: Option<[u8; 3]>,
  /// Draw only the differences on a transparent background.
  pub diff_mask: bool,
}

impl Default for DiffOptions {
  fn default() -> Self {
    Self {
      threshold: 0.1,
      include_aa: false,
      alpha: 0.3,
      aa_color: [255, 255, 0],
      diff_color: [255, 0, 0],
      diff_color_alt: None,
      diff_mask: false,
    }
  }
}

impl DiffOptions {
  /// Exact comparison: any color change is a mismatch, anti-aliasing included.
  pub fn strict() -> Self {
    Self {
      threshold: 0.0,
      include_aa: true,
      ..Self::default()
    }
  }

  /// Sets the perceptual threshold.
  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  /// Counts anti-aliased pixels as mismatches when `include` is true.
  pub fn with_include_aa(mut self, include: bool) -> Self {
    self.include_aa = include;
    self
  }

  /// Sets the baseline opacity in the diff image.
  pub fn with_alpha(mut self, alpha: f64) -> Self {
    self.alpha = alpha;
    self
  }

  /// Sets the anti-aliasing highlight color.
  pub fn with_aa_color(mut self, color: [u8; 3]) -> Self {
    self.aa_color = color;
    self
  }

  /// Sets the mismatch highlight color.
  pub fn with_diff_color(mut self, color: [u8; 3]) -> Self {
    self.diff_color = color;
    self
  }

  /// Sets the color for pixels that got darker.
  pub fn with_diff_color_alt(mut self, color: Option<[u8; 3]>) -> Self {
    self.diff_color_alt = color;
    self
  }

  /// Enables or disables mask-only output.
  pub fn with_diff_mask(mut self, mask: bool) -> Self {
    self.diff_mask = mask;
    self
  }

  /// Checks that threshold and alpha are finite values in `[0, 1]`.
  pub fn validate(&self) -> std::result::Result<(), ConfigError> {
    validate_unit("threshold", self.threshold)?;
    validate_unit("alpha", self.alpha)
  }
}

pub(crate) fn validate_unit(name: &str, value: f64) -> std::result::Result<(), ConfigError> {
  if value.is_finite() && (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(ConfigError::InvalidValue {
      name: name.to_string(),
      value: value.to_string(),
      reason: "must be a finite number between 0 and 1".to_string(),
    })
  }
}

/// Output of a pixel diff.
#[derive(Debug, Clone)]
pub struct PixelDiff {
  /// Pixels classified as mismatched.
  pub mismatched: u64,
  /// Pixels over the threshold that were excluded as anti-aliasing.
  pub anti_aliased: u64,
  /// Visualization of the differences, same size as the inputs.
  pub image: RgbaImage,
}

/// Pixel differencing capability.
///
/// Implementations receive two buffers of identical dimensions and must reject
/// anything else with [`DiffError::DimensionMismatch`].
pub trait PixelDiffer {
  fn diff(&self, baseline: &RgbaImage, current: &RgbaImage, options: &DiffOptions)
    -> Result<PixelDiff>;
}

/// YIQ-distance differ with neighbourhood anti-aliasing detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptualDiffer;

impl PixelDiffer for PerceptualDiffer {
  fn diff(
    &self,
    baseline: &RgbaImage,
    current: &RgbaImage,
    options: &DiffOptions,
  ) -> Result<PixelDiff> {
    if baseline.dimensions() != current.dimensions() {
      return Err(
        DiffError::DimensionMismatch {
          baseline: baseline.dimensions(),
          current: current.dimensions(),
        }
        .into(),
      );
    }

    let (width, height) = baseline.dimensions();
    let img1 = baseline.as_raw();
    let img2 = current.as_raw();
    let mut output = RgbaImage::new(width, height);

    if img1 == img2 {
      if !options.diff_mask {
        for (x, y, px) in baseline.enumerate_pixels() {
          output.put_pixel(x, y, gray_pixel(px, options.alpha));
        }
      }
      return Ok(PixelDiff {
        mismatched: 0,
        anti_aliased: 0,
        image: output,
      });
    }

    let max_delta = MAX_YIQ_DELTA * options.threshold * options.threshold;
    let mut mismatched = 0u64;
    let mut anti_aliased = 0u64;

    for y in 0..height {
      for x in 0..width {
        let pos = offset(x, y, width);
        let delta = color_delta(img1, img2, pos, pos, false);

        if delta.abs() > max_delta {
          if !options.include_aa
            && (is_anti_aliased(img1, x, y, width, height, img2)
              || is_anti_aliased(img2, x, y, width, height, img1))
          {
            anti_aliased += 1;
            if !options.diff_mask {
              output.put_pixel(x, y, opaque(options.aa_color));
            }
          } else {
            let color = match options.diff_color_alt {
              Some(alt) if delta < 0.0 => alt,
              _ => options.diff_color,
            };
            output.put_pixel(x, y, opaque(color));
            mismatched += 1;
          }
        } else if !options.diff_mask {
          output.put_pixel(x, y, gray_pixel(baseline.get_pixel(x, y), options.alpha));
        }
      }
    }

    Ok(PixelDiff {
      mismatched,
      anti_aliased,
      image: output,
    })
  }
}

fn offset(x: u32, y: u32, width: u32) -> usize {
  (y as usize * width as usize + x as usize) * 4
}

fn opaque(color: [u8; 3]) -> Rgba<u8> {
  Rgba([color[0], color[1], color[2], 255])
}

fn gray_pixel(px: &Rgba<u8>, alpha: f64) -> Rgba<u8> {
  let luma = rgb2y(px[0] as f64, px[1] as f64, px[2] as f64);
  let value = blend(luma, alpha * px[3] as f64 / 255.0).clamp(0.0, 255.0) as u8;
  Rgba([value, value, value, 255])
}

/// Blends `c` towards white by `1 - a`.
fn blend(c: f64, a: f64) -> f64 {
  255.0 + (c - 255.0) * a
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
  r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
  r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
  r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// Background that translucent pixels are composited against. Alternates per
/// pixel so that a transparent pixel never equals any single opaque color
/// across a whole region.
fn background(pos: usize) -> (f64, f64, f64) {
  let index = pos / 4;
  let pick = |n: usize| 48.0 + 159.0 * (n % 2) as f64;
  (
    pick(index),
    pick((index as f64 / 1.618033988749895) as usize),
    pick((index as f64 / 2.618033988749895) as usize),
  )
}

/// Squared YIQ distance between the pixel at byte offset `k` of `img1` and
/// `m` of `img2`, plus a coverage term for alpha changes. Negative when the
/// first pixel is brighter. With `y_only` returns the signed brightness delta.
fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
  let (r1, g1, b1, a1) = (
    img1[k] as f64,
    img1[k + 1] as f64,
    img1[k + 2] as f64,
    img1[k + 3] as f64,
  );
  let (r2, g2, b2, a2) = (
    img2[m] as f64,
    img2[m + 1] as f64,
    img2[m + 2] as f64,
    img2[m + 3] as f64,
  );

  let mut dr = r1 - r2;
  let mut dg = g1 - g2;
  let mut db = b1 - b2;
  let da = a1 - a2;

  if dr == 0.0 && dg == 0.0 && db == 0.0 && da == 0.0 {
    return 0.0;
  }

  if a1 < 255.0 || a2 < 255.0 {
    let (rb, gb, bb) = background(k);
    dr = (r1 * a1 - r2 * a2 - rb * da) / 255.0;
    dg = (g1 * a1 - g2 * a2 - gb * da) / 255.0;
    db = (b1 * a1 - b2 * a2 - bb * da) / 255.0;
  }

  let y = rgb2y(dr, dg, db);
  if y_only {
    return y;
  }

  let i = rgb2i(dr, dg, db);
  let q = rgb2q(dr, dg, db);
  let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q + ALPHA_WEIGHT * da * da;

  if y > 0.0 {
    -delta
  } else {
    delta
  }
}

/// Whether the pixel at (x1, y1) of `img` looks like edge smoothing: at most
/// two neighbours share its brightness, and either its darkest or brightest
/// neighbour sits in a flat area in both images.
fn is_anti_aliased(img: &[u8], x1: u32, y1: u32, width: u32, height: u32, other: &[u8]) -> bool {
  let x0 = x1.saturating_sub(1);
  let y0 = y1.saturating_sub(1);
  let x2 = (x1 + 1).min(width - 1);
  let y2 = (y1 + 1).min(height - 1);
  let pos = offset(x1, y1, width);

  let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
  let mut min = 0.0;
  let mut max = 0.0;
  let mut darkest = (0, 0);
  let mut brightest = (0, 0);

  for x in x0..=x2 {
    for y in y0..=y2 {
      if x == x1 && y == y1 {
        continue;
      }
      let delta = color_delta(img, img, pos, offset(x, y, width), true);
      if delta == 0.0 {
        zeroes += 1;
        if zeroes > 2 {
          return false;
        }
      } else if delta < min {
        min = delta;
        darkest = (x, y);
      } else if delta > max {
        max = delta;
        brightest = (x, y);
      }
    }
  }

  if min == 0.0 || max == 0.0 {
    return false;
  }

  (has_many_siblings(img, darkest.0, darkest.1, width, height)
    && has_many_siblings(other, darkest.0, darkest.1, width, height))
    || (has_many_siblings(img, brightest.0, brightest.1, width, height)
      && has_many_siblings(other, brightest.0, brightest.1, width, height))
}

/// Whether more than two neighbours of (x1, y1) have exactly its RGBA value.
fn has_many_siblings(img: &[u8], x1: u32, y1: u32, width: u32, height: u32) -> bool {
  let x0 = x1.saturating_sub(1);
  let y0 = y1.saturating_sub(1);
  let x2 = (x1 + 1).min(width - 1);
  let y2 = (y1 + 1).min(height - 1);
  let pos = offset(x1, y1, width);
  let center = &img[pos..pos + 4];

  let mut zeroes = u32::from(x1 == x0 || x1 == x2 || y1 == y0 || y1 == y2);
  for x in x0..=x2 {
    for y in y0..=y2 {
      if x == x1 && y == y1 {
        continue;
      }
      let other = offset(x, y, width);
      if &img[other..other + 4] == center {
        zeroes += 1;
      }
      if zeroes > 2 {
        return true;
      }
    }
  }
  false
}
