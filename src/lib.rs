//! Visual regression comparison for page screenshots.
//!
//! Baseline captures in `baseline/<name>.png` are compared pixel-by-pixel
//! against `current/<name>.png`. Each comparison writes `diff/<name>-diff.png`
//! and the run ends with `reports/visual-report.html` summarizing every result.
//!
//! ```no_run
//! use visreg::{Comparator, RunConfig, Runner};
//!
//! let mut runner = Runner::new(Comparator::new(RunConfig::default()), std::io::stdout());
//! let outcome = runner.run()?;
//! std::process::exit(outcome.exit_code());
//! # Ok::<(), visreg::Error>(())
//! ```

pub mod canvas;
pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod paths;
pub mod pixel_diff;
pub mod report;
pub mod runner;

pub use codec::{ImageCodec, PngCodec};
pub use compare::{Comparator, Comparison, ComparisonResult};
pub use config::{ArtifactDirs, Overrides, RunConfig};
pub use error::{Error, Result};
pub use pixel_diff::{DiffOptions, PerceptualDiffer, PixelDiff, PixelDiffer};
pub use report::Report;
pub use runner::{RunOutcome, Runner};
