//! Per-name comparison: load, normalize, diff, write the diff image.

use crate::canvas::normalize;
use crate::codec::{load_image, save_image, ImageCodec, PngCodec};
use crate::config::RunConfig;
use crate::error::Result;
use crate::paths::ensure_parent_dir;
use crate::pixel_diff::{PerceptualDiffer, PixelDiffer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of comparing one named capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
  pub name: String,
  /// Normalized (padded) width.
  pub width: u32,
  /// Normalized (padded) height.
  pub height: u32,
  pub total_pixels: u64,
  pub mismatch_count: u64,
  /// `mismatch_count / total_pixels * 100`, rounded to two decimals.
  pub mismatch_percent: f64,
  /// Pixels over the threshold that were classified as anti-aliasing.
  pub anti_aliased_count: u64,
  pub baseline_path: PathBuf,
  pub current_path: PathBuf,
  pub diff_path: PathBuf,
  pub passed: bool,
}

impl ComparisonResult {
  pub fn status_label(&self) -> &'static str {
    if self.passed {
      "PASS"
    } else {
      "FAIL"
    }
  }
}

/// What happened for one name. Missing captures are skips, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
  Compared(ComparisonResult),
  MissingBaseline { name: String, path: PathBuf },
  MissingCurrent { name: String, path: PathBuf },
}

impl Comparison {
  pub fn result(&self) -> Option<&ComparisonResult> {
    match self {
      Comparison::Compared(result) => Some(result),
      _ => None,
    }
  }

  pub fn into_result(self) -> Option<ComparisonResult> {
    match self {
      Comparison::Compared(result) => Some(result),
      _ => None,
    }
  }

  /// Human-readable explanation for a skipped name.
  pub fn notice(&self) -> Option<String> {
    match self {
      Comparison::Compared(_) => None,
      Comparison::MissingBaseline { name, .. } => Some(format!(
        "No baseline found for \"{name}\". Run the capture first to generate a baseline."
      )),
      Comparison::MissingCurrent { name, .. } => Some(format!(
        "No current screenshot found for \"{name}\". Run the capture again to record the current state."
      )),
    }
  }
}

/// Rounds `mismatched / total` as a percentage to two decimal places.
pub fn mismatch_percent(mismatched: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (mismatched as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Runs the load → normalize → diff → write sequence for named captures.
pub struct Comparator<C = PngCodec, D = PerceptualDiffer> {
  config: RunConfig,
  codec: C,
  differ: D,
}

impl Comparator {
  /// Comparator with the PNG codec and the perceptual differ.
  pub fn new(config: RunConfig) -> Self {
    Self::with_backends(config, PngCodec, PerceptualDiffer)
  }
}

impl<C: ImageCodec, D: PixelDiffer> Comparator<C, D> {
  pub fn with_backends(config: RunConfig, codec: C, differ: D) -> Self {
    Self {
      config,
      codec,
      differ,
    }
  }

  pub fn config(&self) -> &RunConfig {
    &self.config
  }

  /// Compares `<baseline>/<name>.png` against `<current>/<name>.png` and writes
  /// `<diff>/<name>-diff.png`, overwriting any previous diff.
  pub fn compare(&self, name: &str) -> Result<Comparison> {
    let dirs = &self.config.dirs;
    let baseline_path = dirs.baseline_path(name);
    let current_path = dirs.current_path(name);
    let diff_path = dirs.diff_path(name);

    if !baseline_path.is_file() {
      return Ok(Comparison::MissingBaseline {
        name: name.to_string(),
        path: baseline_path,
      });
    }
    if !current_path.is_file() {
      return Ok(Comparison::MissingCurrent {
        name: name.to_string(),
        path: current_path,
      });
    }

    let baseline = load_image(&self.codec, &baseline_path)?;
    let current = load_image(&self.codec, &current_path)?;
    let (baseline, current) = normalize(&baseline, &current);
    let (width, height) = baseline.dimensions();

    let diff = self.differ.diff(&baseline, &current, &self.config.diff)?;

    ensure_parent_dir(&diff_path)?;
    save_image(&self.codec, &diff.image, &diff_path)?;
    log::info!("wrote {}", diff_path.display());

    let total_pixels = u64::from(width) * u64::from(height);
    Ok(Comparison::Compared(ComparisonResult {
      name: name.to_string(),
      width,
      height,
      total_pixels,
      mismatch_count: diff.mismatched,
      mismatch_percent: mismatch_percent(diff.mismatched, total_pixels),
      anti_aliased_count: diff.anti_aliased,
      baseline_path,
      current_path,
      diff_path,
      passed: diff.mismatched == 0,
    }))
  }
}
