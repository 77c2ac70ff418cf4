use crate::error::ArtifactError;
use pathdiff::diff_paths;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fs;
use std::path::{Path, PathBuf};

/// Bytes that cannot appear literally in a relative URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

/// Produce a path relative to the report's directory (falls back to absolute).
pub fn path_for_report(base: &Path, target: &Path) -> String {
  let base = absolute(base);
  let target = absolute(target);
  let path = diff_paths(&target, &base).unwrap_or(target);
  let rendered = path.display().to_string();
  if cfg!(windows) {
    rendered.replace('\\', "/")
  } else {
    rendered
  }
}

/// [`path_for_report`] as a URL reference: each `/`-separated segment is
/// percent-encoded so names like `50%` or `a#b` still link correctly.
pub fn href_for_report(base: &Path, target: &Path) -> String {
  path_for_report(base, target)
    .split('/')
    .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
    .collect::<Vec<_>>()
    .join("/")
}

/// Absolute form of `path` for console messages; `path` itself if it cannot
/// be resolved (e.g. it does not exist yet).
pub fn display_path(path: &Path) -> String {
  match fs::canonicalize(path) {
    Ok(resolved) => resolved.display().to_string(),
    Err(_) => path.display().to_string(),
  }
}

/// Ensure the parent directory for a file exists.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ArtifactError> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent).map_err(|e| ArtifactError::Write {
        path: path.display().to_string(),
        reason: format!(
          "failed to create parent directory {}: {e}",
          parent.display()
        ),
      })?;
    }
  }
  Ok(())
}

fn absolute(path: &Path) -> PathBuf {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
