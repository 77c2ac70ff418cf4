//! Run configuration: artifact directory layout and diff options.
//!
//! Every setting resolves the same way: explicit value (CLI flag) first,
//! then a `VISREG_*` environment variable, then the built-in default.

use crate::error::ConfigError;
use crate::pixel_diff::{validate_unit, DiffOptions};
use std::path::{Path, PathBuf};

pub const ENV_THRESHOLD: &str = "VISREG_THRESHOLD";
pub const ENV_ALPHA: &str = "VISREG_ALPHA";
pub const ENV_INCLUDE_AA: &str = "VISREG_INCLUDE_AA";
pub const ENV_BASELINE_DIR: &str = "VISREG_BASELINE_DIR";
pub const ENV_CURRENT_DIR: &str = "VISREG_CURRENT_DIR";
pub const ENV_DIFF_DIR: &str = "VISREG_DIFF_DIR";
pub const ENV_REPORTS_DIR: &str = "VISREG_REPORTS_DIR";

pub const HTML_REPORT_NAME: &str = "visual-report.html";
pub const JSON_REPORT_NAME: &str = "visual-report.json";

/// Where baseline/current captures are read from and artifacts are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDirs {
  pub baseline: PathBuf,
  pub current: PathBuf,
  pub diff: PathBuf,
  pub reports: PathBuf,
}

impl Default for ArtifactDirs {
  fn default() -> Self {
    Self {
      baseline: PathBuf::from("./baseline"),
      current: PathBuf::from("./current"),
      diff: PathBuf::from("./diff"),
      reports: PathBuf::from("./reports"),
    }
  }
}

impl ArtifactDirs {
  /// Layout with all four directories under `root`.
  pub fn under(root: &Path) -> Self {
    Self {
      baseline: root.join("baseline"),
      current: root.join("current"),
      diff: root.join("diff"),
      reports: root.join("reports"),
    }
  }

  pub fn baseline_path(&self, name: &str) -> PathBuf {
    self.baseline.join(format!("{name}.png"))
  }

  pub fn current_path(&self, name: &str) -> PathBuf {
    self.current.join(format!("{name}.png"))
  }

  pub fn diff_path(&self, name: &str) -> PathBuf {
    self.diff.join(format!("{name}-diff.png"))
  }

  pub fn html_report_path(&self) -> PathBuf {
    self.reports.join(HTML_REPORT_NAME)
  }

  pub fn json_report_path(&self) -> PathBuf {
    self.reports.join(JSON_REPORT_NAME)
  }
}

/// Everything a run needs, fixed for its duration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
  pub dirs: ArtifactDirs,
  pub diff: DiffOptions,
  /// Also write `visual-report.json` next to the HTML report.
  pub write_json: bool,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      dirs: ArtifactDirs::default(),
      diff: DiffOptions::default(),
      write_json: true,
    }
  }
}

/// Explicit overrides, typically parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub baseline_dir: Option<PathBuf>,
  pub current_dir: Option<PathBuf>,
  pub diff_dir: Option<PathBuf>,
  pub reports_dir: Option<PathBuf>,
  pub threshold: Option<f64>,
  pub alpha: Option<f64>,
  pub include_aa: bool,
  pub diff_mask: bool,
  pub no_json: bool,
}

impl RunConfig {
  /// Builds a config from `overrides`, falling back to the process environment.
  pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
    Self::resolve_with(overrides, |key| std::env::var(key).ok())
  }

  /// Same as [`RunConfig::resolve`] with an explicit environment lookup.
  pub fn resolve_with<F>(overrides: Overrides, env: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = ArtifactDirs::default();
    let dir = |flag: Option<PathBuf>, key: &str, default: PathBuf| {
      flag
        .or_else(|| env(key).filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or(default)
    };
    let dirs = ArtifactDirs {
      baseline: dir(overrides.baseline_dir, ENV_BASELINE_DIR, defaults.baseline),
      current: dir(overrides.current_dir, ENV_CURRENT_DIR, defaults.current),
      diff: dir(overrides.diff_dir, ENV_DIFF_DIR, defaults.diff),
      reports: dir(overrides.reports_dir, ENV_REPORTS_DIR, defaults.reports),
    };

    let base = DiffOptions::default();
    let threshold = resolve_unit(
      "threshold",
      overrides.threshold,
      env(ENV_THRESHOLD),
      base.threshold,
    )?;
    let alpha = resolve_unit("alpha", overrides.alpha, env(ENV_ALPHA), base.alpha)?;
    let include_aa =
      overrides.include_aa || resolve_flag(ENV_INCLUDE_AA, env(ENV_INCLUDE_AA))?;

    let diff = base
      .with_threshold(threshold)
      .with_alpha(alpha)
      .with_include_aa(include_aa)
      .with_diff_mask(overrides.diff_mask);
    diff.validate()?;

    Ok(Self {
      dirs,
      diff,
      write_json: !overrides.no_json,
    })
  }
}

fn resolve_unit(
  name: &str,
  flag: Option<f64>,
  env: Option<String>,
  default: f64,
) -> Result<f64, ConfigError> {
  if let Some(value) = flag {
    validate_unit(name, value)?;
    return Ok(value);
  }
  if let Some(raw) = env {
    let parsed = raw.trim().parse::<f64>().map_err(|e| ConfigError::InvalidValue {
      name: name.to_string(),
      value: raw.clone(),
      reason: e.to_string(),
    })?;
    validate_unit(name, parsed)?;
    return Ok(parsed);
  }
  Ok(default)
}

fn resolve_flag(name: &str, env: Option<String>) -> Result<bool, ConfigError> {
  let Some(raw) = env else {
    return Ok(false);
  };
  match raw.trim().to_ascii_lowercase().as_str() {
    "" | "0" | "false" | "no" | "off" => Ok(false),
    "1" | "true" | "yes" | "on" => Ok(true),
    _ => Err(ConfigError::InvalidValue {
      name: name.to_string(),
      value: raw,
      reason: "expected a boolean (1/0, true/false)".to_string(),
    }),
  }
}
