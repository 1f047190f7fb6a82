//! Per-experiment summaries: collect each run's artifacts and render the report.

use std::fmt::Write;
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::PathBuf;

use log_indicators::report::cycle_time_line;
use log_indicators::{Engine, LogIndicators};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::conformance::{capture_number, ConformanceSource};
use crate::types::*;

/// Line between run blocks of an experiment report.
pub const SEPARATOR: &str = "--------------------------------------------------";
/// Line under an experiment report's title.
pub const TITLE_RULE: &str = "==================================================";
pub const FILE_NOT_FOUND: &str = "File not found";

pub(crate) static CYCLE_TIME: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"Average Product Cycle Time: (-?[0-9.]+) seconds").expect("static regex"));

/// Supplies the cycle-time line of a run, or `None` when there is none.
pub trait CycleTimeSource {
  fn cycle_time(&self, key: RunKey) -> Option<CycleTimeArtifact>;
}

impl CycleTimeArtifact {
  pub fn parse_line(line: &str) -> Self {
    let line = line.trim();
    Self {
      line: line.to_string(),
      seconds: capture_number(&CYCLE_TIME, line),
    }
  }

  /// Take the average cycle time from computed indicators.
  ///
  /// The value is the one the line shows (two decimals), so statistics match
  /// those rebuilt later from rendered reports.
  pub fn from_indicators(indicators: &LogIndicators) -> Self {
    Self::parse_line(&cycle_time_line(indicators.cycle_time.average_seconds))
  }
}

/// KPI reports `Exp{e}Run{r}.txt`; only the first line is read.
#[derive(Debug, Clone)]
pub struct KpiDir {
  pub dir: PathBuf,
}

impl KpiDir {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }
}

impl CycleTimeSource for KpiDir {
  fn cycle_time(&self, key: RunKey) -> Option<CycleTimeArtifact> {
    let path = self.dir.join(key.kpi_file_name());
    let file = match fs::File::open(&path) {
      Ok(f) => f,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        warn!(file = %path.display(), "cycle-time file not found");
        return None;
      }
      Err(e) => {
        warn!(file = %path.display(), error = %e, "cycle-time file unreadable");
        return None;
      }
    };
    let mut first = String::new();
    if let Err(e) = BufReader::new(file).read_line(&mut first) {
      warn!(file = %path.display(), error = %e, "cycle-time file unreadable");
      return None;
    }
    Some(CycleTimeArtifact::parse_line(&first))
  }
}

/// Raw simulator files `Exp{e}Run{r}.txt`, turned into indicators in memory.
pub struct RawLogDir {
  pub dir: PathBuf,
  engine: Engine,
}

impl RawLogDir {
  pub fn new(dir: impl Into<PathBuf>, engine: Engine) -> Self {
    Self {
      dir: dir.into(),
      engine,
    }
  }
}

impl CycleTimeSource for RawLogDir {
  fn cycle_time(&self, key: RunKey) -> Option<CycleTimeArtifact> {
    let path = self.dir.join(key.kpi_file_name());
    if !path.is_file() {
      warn!(file = %path.display(), "raw input not found");
      return None;
    }
    match self.engine.process_file(&path) {
      Ok(outcome) => Some(CycleTimeArtifact::from_indicators(&outcome.indicators)),
      Err(e) => {
        warn!(file = %path.display(), error = %e, "raw input skipped");
        None
      }
    }
  }
}

/// Collect runs `1..=num_runs` of one experiment. Never fails; gaps stay visible.
pub fn summarize_experiment(
  experiment_id: u32,
  num_runs: u32,
  conformance: &dyn ConformanceSource,
  cycle_times: &dyn CycleTimeSource,
) -> ExperimentSummary {
  let runs = (1..=num_runs)
    .map(|run_id| {
      let key = RunKey::new(experiment_id, run_id);
      RunSummary {
        run_id,
        metrics: conformance.scores(key),
        cycle_time: cycle_times.cycle_time(key),
      }
    })
    .collect::<Vec<_>>();

  let complete = runs
    .iter()
    .filter(|r| r.metrics.is_some() && r.cycle_time.is_some())
    .count();
  info!(experiment = experiment_id, runs = runs.len(), complete, "experiment summarized");

  ExperimentSummary {
    experiment_id,
    runs,
  }
}

impl ExperimentSummary {
  /// The experiment report: a title block, then one separator-terminated block per run.
  pub fn render(&self) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Experiment {} Overview", self.experiment_id);
    let _ = writeln!(out, "{}", TITLE_RULE);

    for run in &self.runs {
      let _ = writeln!(out, "Run {}:", run.run_id);
      match &run.metrics {
        Some(m) => {
          let _ = writeln!(out, "Metrics:\n{}", m.text);
        }
        None => {
          let _ = writeln!(out, "Metrics: {}", FILE_NOT_FOUND);
        }
      }
      match &run.cycle_time {
        Some(c) => {
          let _ = writeln!(out, "Product Cycle Time:\n{}", c.line);
        }
        None => {
          let _ = writeln!(out, "Product Cycle Time: {}", FILE_NOT_FOUND);
        }
      }
      let _ = writeln!(out, "{}", SEPARATOR);
    }
    out
  }

  /// Scalar rows in run order.
  pub fn results(&self) -> Vec<RunResult> {
    self
      .runs
      .iter()
      .map(|run| RunResult {
        experiment_id: self.experiment_id,
        run_id: run.run_id,
        precision: run.precision(),
        cycle_time: run.cycle_time_seconds(),
      })
      .collect()
  }
}
