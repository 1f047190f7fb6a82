//! Core types for run/experiment aggregation.

use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Observed values
// ---------------------------------------------------------------------------

/// A value that an upstream step may have failed to produce.
///
/// Displays as the value (honouring precision flags) or `N/A`; serializes as
/// the value or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Observed<T> {
  Defined(T),
  Unavailable,
}

impl<T> Observed<T> {
  pub fn value(self) -> Option<T> {
    match self {
      Self::Defined(v) => Some(v),
      Self::Unavailable => None,
    }
  }

  pub fn is_defined(&self) -> bool {
    matches!(self, Self::Defined(_))
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observed<U> {
    match self {
      Self::Defined(v) => Observed::Defined(f(v)),
      Self::Unavailable => Observed::Unavailable,
    }
  }
}

impl Observed<f64> {
  /// Non-finite numbers are not observations.
  pub fn finite(v: f64) -> Self {
    if v.is_finite() {
      Self::Defined(v)
    } else {
      Self::Unavailable
    }
  }
}

impl<T> From<Option<T>> for Observed<T> {
  fn from(v: Option<T>) -> Self {
    match v {
      Some(v) => Self::Defined(v),
      None => Self::Unavailable,
    }
  }
}

impl<T: fmt::Display> fmt::Display for Observed<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Defined(v) => fmt::Display::fmt(v, f),
      Self::Unavailable => f.write_str("N/A"),
    }
  }
}

// ---------------------------------------------------------------------------
// Run identity
// ---------------------------------------------------------------------------

/// One simulation run: experiment `1..=N`, run `1..=M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunKey {
  pub experiment: u32,
  pub run: u32,
}

impl RunKey {
  pub fn new(experiment: u32, run: u32) -> Self {
    Self { experiment, run }
  }

  /// Stem shared by the raw input and the KPI report of this run.
  pub fn stem(&self) -> String {
    format!("Exp{}Run{}", self.experiment, self.run)
  }

  pub fn metrics_file_name(&self) -> String {
    format!("{}_metrics.txt", self.stem())
  }

  pub fn kpi_file_name(&self) -> String {
    format!("{}.txt", self.stem())
  }
}

// ---------------------------------------------------------------------------
// Per-run artifacts
// ---------------------------------------------------------------------------

/// Scores from the external discovery + token-based replay step. Opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConformanceScores {
  /// Percentage of fitting traces, 0-100.
  pub fitness_pct: Observed<f64>,
  /// Precision ratio, 0-1.
  pub precision: Observed<f64>,
}

/// Metrics block of one run as shown in the experiment report.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsArtifact {
  pub text: String,
  pub scores: ConformanceScores,
}

/// Cycle-time line of one run as shown in the experiment report.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleTimeArtifact {
  pub line: String,
  pub seconds: Observed<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
  pub run_id: u32,
  /// `None` when the conformance step left nothing for this run.
  pub metrics: Option<MetricsArtifact>,
  /// `None` when no cycle time could be obtained for this run.
  pub cycle_time: Option<CycleTimeArtifact>,
}

impl RunSummary {
  pub fn precision(&self) -> Observed<f64> {
    self
      .metrics
      .as_ref()
      .map_or(Observed::Unavailable, |m| m.scores.precision)
  }

  pub fn cycle_time_seconds(&self) -> Observed<f64> {
    self
      .cycle_time
      .as_ref()
      .map_or(Observed::Unavailable, |c| c.seconds)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSummary {
  pub experiment_id: u32,
  /// In run order.
  pub runs: Vec<RunSummary>,
}

// ---------------------------------------------------------------------------
// Tabular rows
// ---------------------------------------------------------------------------

/// Scalar indicators of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunResult {
  pub experiment_id: u32,
  pub run_id: u32,
  pub precision: Observed<f64>,
  pub cycle_time: Observed<f64>,
}

/// Running mean and sample standard deviation at some point of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Moments {
  pub mean: f64,
  pub std_dev: f64,
}

/// One run with the cumulative statistics after it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativeRow {
  #[serde(flatten)]
  pub result: RunResult,
  pub cumulative_precision: Observed<Moments>,
  pub cumulative_cycle_time: Observed<Moments>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_honours_precision_and_na() {
    assert_eq!(format!("{:.4}", Observed::Defined(0.83421_f64)), "0.8342");
    assert_eq!(format!("{:.2}", Observed::<f64>::Unavailable), "N/A");
    assert_eq!(format!("{}", Observed::Defined(1.5_f64)), "1.5");
  }

  #[test]
  fn non_finite_is_unavailable() {
    assert_eq!(Observed::finite(f64::NAN), Observed::Unavailable);
    assert_eq!(Observed::finite(f64::INFINITY), Observed::Unavailable);
    assert_eq!(Observed::finite(0.5), Observed::Defined(0.5));
  }

  #[test]
  fn unavailable_serializes_as_null() {
    let row = RunResult {
      experiment_id: 1,
      run_id: 2,
      precision: Observed::Defined(0.5),
      cycle_time: Observed::Unavailable,
    };
    let json = serde_json::to_string(&row).unwrap();
    assert_eq!(
      json,
      r#"{"experiment_id":1,"run_id":2,"precision":0.5,"cycle_time":null}"#
    );
  }

  #[test]
  fn run_key_file_names() {
    let key = RunKey::new(3, 14);
    assert_eq!(key.kpi_file_name(), "Exp3Run14.txt");
    assert_eq!(key.metrics_file_name(), "Exp3Run14_metrics.txt");
  }

  #[test]
  fn missing_artifacts_read_as_unavailable() {
    let run = RunSummary {
      run_id: 1,
      metrics: None,
      cycle_time: None,
    };
    assert_eq!(run.precision(), Observed::Unavailable);
    assert_eq!(run.cycle_time_seconds(), Observed::Unavailable);
  }
}
