//! Binary entrypoint: process a directory of raw simulator files.
//!
//! Writes one KPI report per input file and prints one JSON line per file to
//! stdout, either the file's indicators or an error object. Diagnostics go to
//! stderr through `tracing` (`RUST_LOG` to adjust).

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log_indicators::{Engine, IndicatorConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Extract cycle-time and utilization indicators from simulator output.
#[derive(Parser)]
#[command(name = "log-indicators")]
struct Args {
  /// TOML file overriding activity markers, pattern, or delimiter.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Directory of raw tab-delimited `*.txt` files.
  #[arg(long, default_value = "01_raw_input")]
  input: PathBuf,

  /// Directory for KPI reports.
  #[arg(long, default_value = "03_event_logs_KPIs")]
  output: PathBuf,

  /// Directory for JSON event logs (with --emit-log).
  #[arg(long, default_value = "02_processed_input")]
  log_dir: PathBuf,

  /// Also write each event log as JSON.
  #[arg(long)]
  emit_log: bool,

  /// Override the start activity marker.
  #[arg(long)]
  start_activity: Option<String>,

  /// Override the end activity marker.
  #[arg(long)]
  end_activity: Option<String>,
}

#[derive(Serialize)]
struct ErrorLine {
  error: bool,
  file: String,
  message: String,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| "log_indicators=info".into()),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => IndicatorConfig::load(path)
      .with_context(|| format!("loading config {}", path.display()))?,
    None => IndicatorConfig::default(),
  };
  if let Some(start) = args.start_activity {
    config.start_activity = start;
  }
  if let Some(end) = args.end_activity {
    config.end_activity = end;
  }

  let engine = Engine::new(config).context("invalid indicator config")?;
  let log_dir = args.emit_log.then_some(args.log_dir.as_path());
  let entries = engine
    .process_dir(&args.input, &args.output, log_dir)
    .with_context(|| format!("processing {}", args.input.display()))?;

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  for entry in &entries {
    match &entry.result {
      Ok(outcome) => serde_json::to_writer(&mut out, outcome)?,
      Err(e) => serde_json::to_writer(
        &mut out,
        &ErrorLine {
          error: true,
          file: entry.input.display().to_string(),
          message: e.to_string(),
        },
      )?,
    }
    writeln!(out)?;
  }
  out.flush()?;

  let failed = entries.iter().filter(|e| e.result.is_err()).count();
  tracing::info!(files = entries.len(), failed, "done");
  Ok(())
}
