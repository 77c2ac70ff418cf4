//! Run driver: discover baseline names, compare each, report, decide exit status.

use crate::codec::ImageCodec;
use crate::compare::{Comparator, Comparison, ComparisonResult};
use crate::error::{Result, SetupError};
use crate::paths::display_path;
use crate::pixel_diff::PixelDiffer;
use crate::report::{write_html_report, write_json_report, Report};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const RULE: &str = "===========================================";

/// How a run ended, when it got far enough to compare anything.
#[derive(Debug, Clone)]
pub enum RunOutcome {
  /// Every discovered name was skipped for a missing capture.
  AllSkipped { skipped: usize },
  /// At least one comparison ran and a report was written.
  Reported {
    report: Report,
    html_path: PathBuf,
    json_path: Option<PathBuf>,
    skipped: usize,
  },
}

impl RunOutcome {
  /// Process exit status: 0 when nothing failed, 1 otherwise.
  pub fn exit_code(&self) -> i32 {
    match self {
      RunOutcome::AllSkipped { .. } => 0,
      RunOutcome::Reported { report, .. } => {
        if report.all_passed() {
          0
        } else {
          1
        }
      }
    }
  }

  pub fn report(&self) -> Option<&Report> {
    match self {
      RunOutcome::Reported { report, .. } => Some(report),
      RunOutcome::AllSkipped { .. } => None,
    }
  }
}

/// Snapshot of the capture names present in `baseline_dir` (`<name>.png`),
/// sorted by file name.
pub fn discover_names(baseline_dir: &Path) -> Result<Vec<String>> {
  if !baseline_dir.is_dir() {
    return Err(
      SetupError::MissingBaselineDir {
        dir: baseline_dir.display().to_string(),
      }
      .into(),
    );
  }

  let mut names = Vec::new();
  for entry in WalkDir::new(baseline_dir)
    .min_depth(1)
    .max_depth(1)
    .follow_links(true)
    .sort_by_file_name()
  {
    let entry = entry.map_err(|e| {
      std::io::Error::other(format!("failed to list {}: {e}", baseline_dir.display()))
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let file_name = entry.file_name().to_string_lossy();
    if let Some(name) = file_name.strip_suffix(".png") {
      if !name.is_empty() {
        names.push(name.to_string());
      }
    }
  }

  if names.is_empty() {
    return Err(
      SetupError::NoBaselines {
        dir: baseline_dir.display().to_string(),
      }
      .into(),
    );
  }
  Ok(names)
}

/// Sequential driver over every baseline name. Console progress goes to `out`.
pub struct Runner<C, D, W> {
  comparator: Comparator<C, D>,
  out: W,
}

impl<C: ImageCodec, D: PixelDiffer, W: Write> Runner<C, D, W> {
  pub fn new(comparator: Comparator<C, D>, out: W) -> Self {
    Self { comparator, out }
  }

  pub fn into_output(self) -> W {
    self.out
  }

  pub fn run(&mut self) -> Result<RunOutcome> {
    writeln!(self.out, "{RULE}")?;
    writeln!(self.out, "  Visual Regression Comparison")?;
    writeln!(self.out, "{RULE}")?;
    writeln!(self.out)?;

    let config = self.comparator.config().clone();
    let names = match discover_names(&config.dirs.baseline) {
      Ok(names) => names,
      Err(err) => {
        if err.is_setup() {
          writeln!(
            self.out,
            "No baseline images found in {}.",
            display_path(&config.dirs.baseline)
          )?;
          writeln!(
            self.out,
            "Run the screenshot capture first so it writes <name>.png files there."
          )?;
        }
        return Err(err);
      }
    };
    log::debug!("discovered {} baseline(s): {:?}", names.len(), names);

    fs::create_dir_all(&config.dirs.diff)?;
    fs::create_dir_all(&config.dirs.reports)?;

    let mut results: Vec<ComparisonResult> = Vec::new();
    let mut skipped = 0;
    for name in &names {
      match self.comparator.compare(name)? {
        Comparison::Compared(result) => {
          writeln!(
            self.out,
            "[{}] {} - {:.2}% different ({} pixels)",
            result.status_label(),
            result.name,
            result.mismatch_percent,
            result.mismatch_count
          )?;
          results.push(result);
        }
        skip => {
          skipped += 1;
          if let Some(notice) = skip.notice() {
            log::warn!("skipping {name}");
            writeln!(self.out, "{notice}")?;
          }
        }
      }
    }

    if results.is_empty() {
      writeln!(
        self.out,
        "\nNo comparisons were made. Ensure both baseline and current screenshots exist."
      )?;
      return Ok(RunOutcome::AllSkipped { skipped });
    }

    let report = Report::new(results);
    let html_path = config.dirs.html_report_path();
    write_html_report(&report, &html_path)?;
    log::info!("wrote {}", html_path.display());
    writeln!(self.out, "\nHTML report generated: {}", html_path.display())?;

    let json_path = if config.write_json {
      let path = config.dirs.json_report_path();
      write_json_report(&report, &path)?;
      log::info!("wrote {}", path.display());
      writeln!(self.out, "JSON report generated: {}", path.display())?;
      Some(path)
    } else {
      None
    };

    let verdict = if report.all_passed() {
      "ALL TESTS PASSED"
    } else {
      "SOME TESTS FAILED"
    };
    writeln!(self.out, "\nOverall: {verdict}")?;

    Ok(RunOutcome::Reported {
      report,
      html_path,
      json_path,
      skipped,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::PngCodec;
  use crate::config::{ArtifactDirs, RunConfig};
  use crate::error::Error;
  use crate::pixel_diff::PerceptualDiffer;
  use image::{Rgba, RgbaImage};

  type TestRunner = Runner<PngCodec, PerceptualDiffer, Vec<u8>>;

  const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
  const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

  fn runner(root: &Path) -> TestRunner {
    let config = RunConfig {
      dirs: ArtifactDirs::under(root),
      ..RunConfig::default()
    };
    Runner::new(Comparator::new(config), Vec::new())
  }

  fn put(root: &Path, dir: &str, name: &str, color: Rgba<u8>) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    RgbaImage::from_pixel(10, 10, color)
      .save(dir.join(format!("{name}.png")))
      .unwrap();
  }

  fn output(runner: TestRunner) -> String {
    String::from_utf8(runner.into_output()).unwrap()
  }

  #[test]
  fn discovers_png_names_in_sorted_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().join("baseline");
    fs::create_dir_all(dir.join("nested")).unwrap();
    for file in ["home.png", "about.png", "notes.txt", "nested/deep.png"] {
      fs::write(dir.join(file), b"x").unwrap();
    }
    assert_eq!(discover_names(&dir).unwrap(), vec!["about", "home"]);
  }

  #[cfg(unix)]
  #[test]
  fn discovers_symlinked_baselines() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = tmp.path().join("store");
    let dir = tmp.path().join("baseline");
    fs::create_dir_all(&store).unwrap();
    fs::create_dir_all(&dir).unwrap();
    RgbaImage::from_pixel(2, 2, RED)
      .save(store.join("home.png"))
      .unwrap();
    std::os::unix::fs::symlink(store.join("home.png"), dir.join("home.png")).unwrap();

    assert_eq!(discover_names(&dir).unwrap(), vec!["home"]);
  }

  #[cfg(unix)]
  #[test]
  fn symlinked_baseline_runs_through_comparison() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "store", "home", RED);
    fs::create_dir_all(tmp.path().join("baseline")).unwrap();
    std::os::unix::fs::symlink(
      tmp.path().join("store/home.png"),
      tmp.path().join("baseline/home.png"),
    )
    .unwrap();
    put(tmp.path(), "current", "home", RED);

    let mut runner = runner(tmp.path());
    let outcome = runner.run().unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.report().unwrap().totals.passed, 1);
  }

  #[test]
  fn empty_or_missing_baseline_dir_is_setup_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let missing = discover_names(&tmp.path().join("baseline")).unwrap_err();
    assert!(matches!(
      missing,
      Error::Setup(SetupError::MissingBaselineDir { .. })
    ));

    fs::create_dir_all(tmp.path().join("baseline")).unwrap();
    let empty = discover_names(&tmp.path().join("baseline")).unwrap_err();
    assert!(matches!(empty, Error::Setup(SetupError::NoBaselines { .. })));
  }

  #[test]
  fn setup_failure_prints_instructions_and_writes_no_report() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("baseline")).unwrap();
    let mut runner = runner(tmp.path());
    let err = runner.run().unwrap_err();
    assert!(err.is_setup());
    let out = output(runner);
    assert!(out.contains("No baseline images found"));
    assert!(!tmp.path().join("reports/visual-report.html").exists());
  }

  #[test]
  fn all_passing_run_exits_zero() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "baseline", "home", RED);
    put(tmp.path(), "current", "home", RED);

    let mut runner = runner(tmp.path());
    let outcome = runner.run().unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.report().unwrap().totals.passed, 1);

    let out = output(runner);
    assert!(out.contains("[PASS] home - 0.00% different (0 pixels)"));
    assert!(out.contains("Overall: ALL TESTS PASSED"));
    assert!(tmp.path().join("reports/visual-report.html").exists());
    assert!(tmp.path().join("reports/visual-report.json").exists());
    assert!(tmp.path().join("diff/home-diff.png").exists());
  }

  #[test]
  fn one_failure_fails_the_run() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "baseline", "about", RED);
    put(tmp.path(), "current", "about", RED);
    put(tmp.path(), "baseline", "home", RED);
    put(tmp.path(), "current", "home", BLUE);

    let mut runner = runner(tmp.path());
    let outcome = runner.run().unwrap();
    assert_eq!(outcome.exit_code(), 1);

    let report = outcome.report().unwrap();
    let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["about", "home"]);

    let out = output(runner);
    assert!(out.contains("[FAIL] home - 100.00% different (100 pixels)"));
    assert!(out.contains("Overall: SOME TESTS FAILED"));
  }

  #[test]
  fn missing_current_is_skipped_from_report() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "baseline", "home", RED);
    put(tmp.path(), "baseline", "about", RED);
    put(tmp.path(), "current", "about", RED);

    let mut runner = runner(tmp.path());
    let outcome = runner.run().unwrap();
    assert_eq!(outcome.exit_code(), 0);
    let report = outcome.report().unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].name, "about");
    assert!(matches!(outcome, RunOutcome::Reported { skipped: 1, .. }));

    let out = output(runner);
    assert!(out.contains("No current screenshot found for \"home\""));
  }

  #[test]
  fn all_skipped_exits_zero_without_report() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "baseline", "home", RED);

    let mut runner = runner(tmp.path());
    let outcome = runner.run().unwrap();
    assert!(matches!(outcome, RunOutcome::AllSkipped { skipped: 1 }));
    assert_eq!(outcome.exit_code(), 0);
    assert!(!tmp.path().join("reports/visual-report.html").exists());

    let out = output(runner);
    assert!(out.contains("No comparisons were made."));
  }

  #[test]
  fn corrupt_capture_aborts_the_run() {
    let tmp = tempfile::TempDir::new().unwrap();
    put(tmp.path(), "baseline", "home", RED);
    fs::create_dir_all(tmp.path().join("current")).unwrap();
    fs::write(tmp.path().join("current/home.png"), b"garbage").unwrap();

    let mut runner = runner(tmp.path());
    let err = runner.run().unwrap_err();
    assert!(matches!(err, Error::Artifact(_)));
    assert!(!tmp.path().join("reports/visual-report.html").exists());
  }
}
