//! Aggregated run report and its HTML/JSON renderings.

use crate::compare::ComparisonResult;
use crate::error::{ArtifactError, Result};
use crate::paths::{ensure_parent_dir, href_for_report};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
  pub total: usize,
  pub passed: usize,
  pub failed: usize,
}

/// Every comparison of a run, in discovery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
  pub generated_at: DateTime<Local>,
  pub totals: ReportTotals,
  pub results: Vec<ComparisonResult>,
}

impl Report {
  /// Builds a report stamped with the current local time.
  pub fn new(results: Vec<ComparisonResult>) -> Self {
    Self::with_timestamp(results, Local::now())
  }

  pub fn with_timestamp(results: Vec<ComparisonResult>, generated_at: DateTime<Local>) -> Self {
    let passed = results.iter().filter(|r| r.passed).count();
    let totals = ReportTotals {
      total: results.len(),
      passed,
      failed: results.len() - passed,
    };
    Self {
      generated_at,
      totals,
      results,
    }
  }

  pub fn all_passed(&self) -> bool {
    self.totals.failed == 0
  }

  /// Renders the self-contained HTML document. Image links are relative to
  /// `report_dir`, the directory the document will be written into.
  pub fn render_html(&self, report_dir: &Path) -> String {
    let sections = self
      .results
      .iter()
      .map(|result| render_section(result, report_dir))
      .collect::<Vec<_>>()
      .join("\n");

    format!(
      r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Visual Regression Report</title>
  <style>
    * {{ margin: 0; padding: 0; box-sizing: border-box; }}
    body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #0f172a; color: #e2e8f0; padding: 20px; }}
    .header {{ text-align: center; padding: 30px; background: linear-gradient(135deg, #1e293b, #334155); border-radius: 12px; margin-bottom: 30px; }}
    .header h1 {{ font-size: 2rem; color: #38bdf8; }}
    .header p {{ color: #94a3b8; margin-top: 8px; }}
    .summary {{ display: flex; gap: 20px; justify-content: center; margin: 20px 0; }}
    .summary-card {{ padding: 15px 30px; border-radius: 8px; text-align: center; font-weight: bold; font-size: 1.2rem; }}
    .summary-card.pass {{ background: #064e3b; color: #34d399; }}
    .summary-card.fail {{ background: #7f1d1d; color: #f87171; }}
    .summary-card.total {{ background: #1e293b; color: #38bdf8; }}
    .result {{ background: #1e293b; border-radius: 12px; margin-bottom: 30px; overflow: hidden; border: 1px solid #334155; }}
    .result-header {{ padding: 15px 20px; display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #334155; }}
    .result-header h2 {{ font-size: 1.2rem; }}
    .badge {{ padding: 4px 12px; border-radius: 20px; font-size: 0.85rem; font-weight: 600; }}
    .badge.pass {{ background: #064e3b; color: #34d399; }}
    .badge.fail {{ background: #7f1d1d; color: #f87171; }}
    .stats {{ padding: 10px 20px; display: flex; gap: 20px; color: #94a3b8; font-size: 0.9rem; border-bottom: 1px solid #334155; }}
    .images {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 10px; padding: 15px; }}
    .image-box {{ text-align: center; }}
    .image-box p {{ font-size: 0.85rem; color: #94a3b8; margin-bottom: 8px; font-weight: 600; text-transform: uppercase; }}
    .image-box img {{ width: 100%; border-radius: 6px; border: 1px solid #334155; }}
    .footer {{ text-align: center; padding: 20px; color: #475569; font-size: 0.85rem; }}
  </style>
</head>
<body>
  <div class="header">
    <h1>Visual Regression Test Report</h1>
    <p>Generated on {timestamp}</p>
  </div>

  <div class="summary">
    <div class="summary-card total">Total: {total}</div>
    <div class="summary-card pass">Passed: {passed}</div>
    <div class="summary-card fail">Failed: {failed}</div>
  </div>
{sections}

  <div class="footer">
    <p>Visual regression report &mdash; visreg</p>
  </div>
</body>
</html>
"#,
      timestamp = escape_html(&self.generated_at.format(TIMESTAMP_FORMAT).to_string()),
      total = self.totals.total,
      passed = self.totals.passed,
      failed = self.totals.failed,
      sections = sections,
    )
  }
}

fn render_section(result: &ComparisonResult, report_dir: &Path) -> String {
  let (class, label) = if result.passed {
    ("pass", "PASSED")
  } else {
    ("fail", "FAILED")
  };
  format!(
    r#"
  <div class="result">
    <div class="result-header">
      <h2>{name}</h2>
      <span class="badge {class}">{label}</span>
    </div>
    <div class="stats">
      <span>Resolution: {width} x {height}</span>
      <span>Mismatched Pixels: {mismatched}</span>
      <span>Difference: {percent:.2}%</span>
    </div>
    <div class="images">
{baseline}
{current}
{diff}
    </div>
  </div>"#,
    name = escape_html(&result.name),
    width = result.width,
    height = result.height,
    mismatched = group_thousands(result.mismatch_count),
    percent = result.mismatch_percent,
    baseline = image_box("Baseline", &href_for_report(report_dir, &result.baseline_path)),
    current = image_box("Current", &href_for_report(report_dir, &result.current_path)),
    diff = image_box("Diff", &href_for_report(report_dir, &result.diff_path)),
  )
}

fn image_box(label: &str, src: &str) -> String {
  format!(
    r#"      <div class="image-box">
        <p>{l}</p>
        <a href="{p}"><img src="{p}" alt="{l}" loading="lazy"></a>
      </div>"#,
    l = escape_html(label),
    p = escape_html(src),
  )
}

/// Writes the HTML report to `path`, replacing any previous report.
pub fn write_html_report(report: &Report, path: &Path) -> Result<()> {
  ensure_parent_dir(path)?;
  let report_dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  fs::write(path, report.render_html(report_dir)).map_err(|e| ArtifactError::Write {
    path: path.display().to_string(),
    reason: e.to_string(),
  })?;
  Ok(())
}

/// Writes the report as pretty-printed JSON to `path`.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
  ensure_parent_dir(path)?;
  let json = serde_json::to_string_pretty(report).map_err(|e| ArtifactError::Write {
    path: path.display().to_string(),
    reason: format!("failed to serialize JSON report: {e}"),
  })?;
  fs::write(path, json).map_err(|e| ArtifactError::Write {
    path: path.display().to_string(),
    reason: e.to_string(),
  })?;
  Ok(())
}

/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Formats `n` with comma thousands separators (`12345` → `12,345`).
pub fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
