use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use visreg::{Comparator, Overrides, RunConfig, Runner};

#[derive(Parser, Debug)]
#[command(
  name = "visreg",
  about = "Compare current screenshots against baselines and produce a visual regression report"
)]
struct Args {
  /// Directory holding accepted baseline captures (<name>.png) [env: VISREG_BASELINE_DIR]
  #[arg(long)]
  baseline_dir: Option<PathBuf>,

  /// Directory holding current captures (<name>.png) [env: VISREG_CURRENT_DIR]
  #[arg(long)]
  current_dir: Option<PathBuf>,

  /// Directory to write <name>-diff.png images into [env: VISREG_DIFF_DIR]
  #[arg(long)]
  diff_dir: Option<PathBuf>,

  /// Directory to write visual-report.html/json into [env: VISREG_REPORTS_DIR]
  #[arg(long)]
  reports_dir: Option<PathBuf>,

  /// Perceptual threshold (0.0-1.0, lower is stricter). Default 0.1 [env: VISREG_THRESHOLD]
  #[arg(long)]
  threshold: Option<f64>,

  /// Opacity of the baseline drawn under the diff (0.0-1.0). Default 0.3 [env: VISREG_ALPHA]
  #[arg(long)]
  alpha: Option<f64>,

  /// Count anti-aliased pixels as mismatches [env: VISREG_INCLUDE_AA]
  #[arg(long)]
  include_aa: bool,

  /// Draw only the differing pixels on a transparent diff image
  #[arg(long)]
  diff_mask: bool,

  /// Skip writing visual-report.json
  #[arg(long)]
  no_json: bool,
}

impl From<Args> for Overrides {
  fn from(args: Args) -> Self {
    Overrides {
      baseline_dir: args.baseline_dir,
      current_dir: args.current_dir,
      diff_dir: args.diff_dir,
      reports_dir: args.reports_dir,
      threshold: args.threshold,
      alpha: args.alpha,
      include_aa: args.include_aa,
      diff_mask: args.diff_mask,
      no_json: args.no_json,
    }
  }
}

fn main() {
  env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

  match run() {
    Ok(exit_code) => std::process::exit(exit_code),
    Err(err) => {
      // setup failures have already printed their instructions
      if !err.is_setup() {
        eprintln!("error: {err}");
      }
      std::process::exit(1);
    }
  }
}

fn run() -> visreg::Result<i32> {
  let args = Args::parse();
  let config = RunConfig::resolve(args.into())?;
  log::debug!("resolved config: {config:?}");

  let stdout = std::io::stdout();
  let mut runner = Runner::new(Comparator::new(config), stdout.lock());
  let outcome = runner.run()?;
  Ok(outcome.exit_code())
}
