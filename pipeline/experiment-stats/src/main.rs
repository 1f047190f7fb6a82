//! Binary entrypoint: build experiment reports and the combined tables.
//!
//! - `summarize`: per-run metrics and KPI reports from earlier stages.
//! - `study`: metrics files plus cycle times computed from raw input in memory.
//! - `combine`: re-read existing experiment reports and rebuild both tables.
//!
//! With `--json`, each run with its cumulative statistics is also printed as
//! one JSON line on stdout. Diagnostics go to stderr (`RUST_LOG`).

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use experiment_stats::conformance::MetricsDir;
use experiment_stats::summary::KpiDir;
use experiment_stats::{ResetPolicy, Study, StudyConfig, StudyOutput};
use tracing_subscriber::EnvFilter;

/// Aggregate process-mining indicators across experiments and runs.
#[derive(Parser)]
#[command(name = "experiment-stats")]
struct Args {
  /// TOML study configuration.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Number of experiments (overrides the config file).
  #[arg(long, global = true)]
  experiments: Option<u32>,

  /// Runs per experiment (overrides the config file).
  #[arg(long, global = true)]
  runs: Option<u32>,

  /// When running statistics start over: per-experiment or global.
  #[arg(long, global = true)]
  reset: Option<ResetPolicy>,

  /// Print cumulative rows as JSON lines.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Summaries from metrics files and KPI reports.
  Summarize,
  /// Summaries from metrics files and raw simulator input.
  Study,
  /// Tables from existing experiment reports.
  Combine,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| "experiment_stats=info,log_indicators=warn".into()),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => StudyConfig::load(path)
      .with_context(|| format!("loading config {}", path.display()))?,
    None => StudyConfig::default(),
  };
  if let Some(n) = args.experiments {
    config.num_experiments = n;
  }
  if let Some(m) = args.runs {
    config.num_runs = m;
  }
  if let Some(reset) = args.reset {
    config.reset = reset;
  }

  let study = Study::new(config).context("invalid study config")?;
  let conformance = MetricsDir::new(&study.config().conformance_dir);

  let output = match args.command {
    Command::Summarize => {
      let kpis = KpiDir::new(&study.config().kpi_dir);
      study.write_reports(&study.summaries(&conformance, &kpis))?
    }
    Command::Study => {
      let raw = study.raw_log_source().context("invalid indicator config")?;
      study.write_reports(&study.summaries(&conformance, &raw))?
    }
    Command::Combine => study.write_tables(study.rows_from_reports()?)?,
  };

  if args.json {
    print_json(&output)?;
  }

  tracing::info!(
    rows = output.rows.len(),
    dir = %study.config().summary_dir.display(),
    "done"
  );
  Ok(())
}

fn print_json(output: &StudyOutput) -> Result<()> {
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  for row in &output.cumulative {
    serde_json::to_writer(&mut out, row)?;
    writeln!(out)?;
  }
  out.flush()?;
  Ok(())
}
