use image::RgbaImage;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const ENV_KEYS: [&str; 7] = [
  "VISREG_THRESHOLD",
  "VISREG_ALPHA",
  "VISREG_INCLUDE_AA",
  "VISREG_BASELINE_DIR",
  "VISREG_CURRENT_DIR",
  "VISREG_DIFF_DIR",
  "VISREG_REPORTS_DIR",
];

fn write_color_png(path: &Path, color: [u8; 4]) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  let img = RgbaImage::from_pixel(4, 4, image::Rgba(color));
  img.save(path).expect("save png");
}

fn visreg(root: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_visreg"));
  cmd.current_dir(root).args(args);
  for key in ENV_KEYS {
    cmd.env_remove(key);
  }
  cmd.envs(envs.iter().copied());
  cmd.output().expect("run visreg")
}

fn read_report(root: &Path) -> Value {
  let json_path = root.join("reports/visual-report.json");
  assert!(json_path.exists(), "json report missing");
  serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap()
}

#[test]
fn visreg_passes_identical_captures() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  write_color_png(&tmp.path().join("baseline/home.png"), [10, 20, 30, 255]);
  write_color_png(&tmp.path().join("current/home.png"), [10, 20, 30, 255]);

  let output = visreg(tmp.path(), &[], &[]);
  assert_eq!(output.status.code(), Some(0), "expected success");

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Visual Regression Comparison"), "{stdout}");
  assert!(stdout.contains("[PASS] home - 0.00% different (0 pixels)"), "{stdout}");
  assert!(stdout.contains("Overall: ALL TESTS PASSED"), "{stdout}");

  let report = read_report(tmp.path());
  assert_eq!(report["totals"]["total"].as_u64(), Some(1));
  assert_eq!(report["totals"]["passed"].as_u64(), Some(1));
  assert_eq!(report["results"][0]["name"], "home");
  assert_eq!(report["results"][0]["passed"], true);

  assert!(tmp.path().join("diff/home-diff.png").exists(), "diff image missing");
  let html = fs::read_to_string(tmp.path().join("reports/visual-report.html")).unwrap();
  assert!(html.contains("../baseline/home.png"), "baseline link missing");
  assert!(html.contains("../diff/home-diff.png"), "diff link missing");
}

#[test]
fn visreg_fails_on_changed_capture() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  write_color_png(&tmp.path().join("baseline/about.png"), [255, 0, 0, 255]);
  write_color_png(&tmp.path().join("current/about.png"), [0, 0, 255, 255]);
  write_color_png(&tmp.path().join("baseline/home.png"), [10, 20, 30, 255]);
  write_color_png(&tmp.path().join("current/home.png"), [10, 20, 30, 255]);

  let output = visreg(tmp.path(), &[], &[]);
  assert_eq!(output.status.code(), Some(1), "expected failure");

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(
    stdout.contains("[FAIL] about - 100.00% different (16 pixels)"),
    "{stdout}"
  );
  assert!(stdout.contains("Overall: SOME TESTS FAILED"), "{stdout}");

  let report = read_report(tmp.path());
  assert_eq!(report["totals"]["failed"].as_u64(), Some(1));
  assert_eq!(report["results"][0]["name"], "about");
  assert_eq!(report["results"][0]["mismatch_count"].as_u64(), Some(16));
}

#[test]
fn visreg_skips_missing_current_capture() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  write_color_png(&tmp.path().join("baseline/home.png"), [1, 2, 3, 255]);
  write_color_png(&tmp.path().join("baseline/pricing.png"), [1, 2, 3, 255]);
  write_color_png(&tmp.path().join("current/home.png"), [1, 2, 3, 255]);

  let output = visreg(tmp.path(), &[], &[]);
  assert_eq!(output.status.code(), Some(0));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(
    stdout.contains("No current screenshot found for \"pricing\""),
    "{stdout}"
  );
  let report = read_report(tmp.path());
  assert_eq!(report["results"].as_array().map(Vec::len), Some(1));
}

#[test]
fn visreg_without_baselines_exits_one_and_writes_nothing() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  fs::create_dir_all(tmp.path().join("baseline")).unwrap();

  let output = visreg(tmp.path(), &[], &[]);
  assert_eq!(output.status.code(), Some(1));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("No baseline images found"), "{stdout}");
  assert!(!tmp.path().join("reports/visual-report.html").exists());
}

#[test]
fn visreg_reads_directories_and_threshold_from_env() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  write_color_png(&tmp.path().join("golden/home.png"), [100, 100, 100, 255]);
  write_color_png(&tmp.path().join("shots/home.png"), [104, 100, 100, 255]);

  let strict = visreg(
    tmp.path(),
    &["--no-json"],
    &[
      ("VISREG_BASELINE_DIR", "golden"),
      ("VISREG_CURRENT_DIR", "shots"),
      ("VISREG_THRESHOLD", "0"),
    ],
  );
  assert_eq!(strict.status.code(), Some(1), "zero threshold should flag any change");
  assert!(tmp.path().join("reports/visual-report.html").exists());
  assert!(!tmp.path().join("reports/visual-report.json").exists());

  let flags_only_dirs = visreg(
    tmp.path(),
    &["--baseline-dir", "golden", "--current-dir", "shots"],
    &[("VISREG_THRESHOLD", "0")],
  );
  assert_eq!(flags_only_dirs.status.code(), Some(1), "env threshold still applies");

  let flag_wins = visreg(
    tmp.path(),
    &[
      "--baseline-dir",
      "golden",
      "--current-dir",
      "shots",
      "--threshold",
      "0.1",
    ],
    &[("VISREG_THRESHOLD", "0")],
  );
  assert_eq!(flag_wins.status.code(), Some(0), "flag should override env");
}

#[test]
fn visreg_rejects_out_of_range_threshold() {
  let tmp = tempfile::TempDir::new().expect("tempdir");
  write_color_png(&tmp.path().join("baseline/home.png"), [1, 2, 3, 255]);
  write_color_png(&tmp.path().join("current/home.png"), [1, 2, 3, 255]);

  let output = visreg(tmp.path(), &[], &[("VISREG_THRESHOLD", "1.5")]);
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("threshold"), "{stderr}");
  assert!(!tmp.path().join("reports").exists());
}
