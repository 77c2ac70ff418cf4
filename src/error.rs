//! Error types for visreg
//!
//! Errors are grouped by concern:
//! - Setup errors (no baselines to compare against)
//! - Artifact errors (reading, decoding and writing PNG artifacts)
//! - Codec errors (raw PNG encode/decode failures)
//! - Diff errors (misuse of the pixel differ)
//! - Config errors (out-of-range thresholds, bad environment overrides)
//!
//! A baseline or current capture that is simply absent is not an error: the
//! comparison step reports it as a skip so the run can continue.

use thiserror::Error;

/// Result type alias for visreg operations
///
/// # Examples
///
/// ```
/// use visreg::Result;
///
/// fn discover() -> Result<Vec<String>> {
///     Ok(vec!["home".to_string()])
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for visreg
///
/// Each variant wraps a more specific error type for that concern.
///
/// # Examples
///
/// ```
/// use visreg::Error;
/// use visreg::error::SetupError;
///
/// fn run() -> Result<(), Error> {
///     Err(Error::Setup(SetupError::NoBaselines {
///         dir: "./baseline".to_string(),
///     }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Nothing to compare: the baseline directory is missing or empty
  #[error("Setup error: {0}")]
  Setup(#[from] SetupError),

  /// A baseline, current, diff or report artifact could not be processed
  #[error("Artifact error: {0}")]
  Artifact(#[from] ArtifactError),

  /// PNG encoding or decoding failed outside of a file context
  #[error("Codec error: {0}")]
  Codec(#[from] CodecError),

  /// The pixel differ was used incorrectly
  #[error("Diff error: {0}")]
  Diff(#[from] DiffError),

  /// Invalid configuration value
  #[error("Config error: {0}")]
  Config(#[from] ConfigError),

  /// I/O error (directory creation, listing, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors that make a run impossible before any comparison starts.
#[derive(Error, Debug, Clone)]
pub enum SetupError {
  /// The baseline directory exists but holds no `.png` files
  #[error("No baseline images found in {dir}")]
  NoBaselines { dir: String },

  /// The baseline directory does not exist at all
  #[error("Baseline directory {dir} does not exist")]
  MissingBaselineDir { dir: String },
}

/// Errors tied to a specific artifact on disk.
#[derive(Error, Debug)]
pub enum ArtifactError {
  /// The artifact does not exist
  #[error("Artifact not found: {path}")]
  NotFound { path: String },

  /// The artifact exists but could not be read
  #[error("Failed to read {path}: {reason}")]
  Read { path: String, reason: String },

  /// The artifact bytes are not a valid PNG image
  #[error("Failed to decode {path}: {source}")]
  Decode {
    path: String,
    #[source]
    source: CodecError,
  },

  /// A diff image or report could not be written
  #[error("Failed to write {path}: {reason}")]
  Write { path: String, reason: String },
}

/// Raw codec failures, independent of where the bytes came from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
  /// Input bytes could not be decoded
  #[error("invalid {format} data: {reason}")]
  DecodeFailed { format: String, reason: String },

  /// The image could not be encoded
  #[error("failed to encode image as {format}: {reason}")]
  EncodeFailed { format: String, reason: String },
}

/// Errors raised by pixel differ implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
  /// Both inputs must be normalized to the same size first
  #[error("Image dimensions differ: baseline {}x{}, current {}x{}", .baseline.0, .baseline.1, .current.0, .current.1)]
  DimensionMismatch {
    baseline: (u32, u32),
    current: (u32, u32),
  },
}

/// Errors in run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  /// A setting is out of range or cannot be parsed
  #[error("Invalid {name} '{value}': {reason}")]
  InvalidValue {
    name: String,
    value: String,
    reason: String,
  },
}

impl Error {
  /// Whether this error means the run could not start at all.
  pub fn is_setup(&self) -> bool {
    matches!(self, Error::Setup(_))
  }
}
