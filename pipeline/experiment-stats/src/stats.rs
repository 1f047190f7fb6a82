//! Cumulative statistics: running mean / sample standard deviation over an ordered walk of runs.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::Deserialize;

use crate::combine::point_values;
use crate::types::*;

pub const CUMULATIVE_HEADER: &str = "Experiment;Run;Precision;Average_Product_Cycle_Time_Seconds;\
Cumulative_Average_Precision;Cumulative_StdDev_Precision;\
Cumulative_Average_Cycle_Time;Cumulative_StdDev_Cycle_Time";

/// Count, mean, and sum of squared deviations (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
  count: u64,
  mean: f64,
  m2: f64,
}

impl RunningStats {
  pub fn push(self, x: f64) -> Self {
    let count = self.count + 1;
    let delta = x - self.mean;
    let mean = self.mean + delta / count as f64;
    let m2 = self.m2 + delta * (x - mean);
    Self { count, mean, m2 }
  }

  pub fn count(&self) -> u64 {
    self.count
  }

  pub fn mean(&self) -> Option<f64> {
    (self.count > 0).then_some(self.mean)
  }

  /// Sample standard deviation; exactly 0.0 for a single value.
  pub fn std_dev(&self) -> Option<f64> {
    match self.count {
      0 => None,
      1 => Some(0.0),
      n => Some((self.m2 / (n - 1) as f64).sqrt()),
    }
  }

  pub fn moments(&self) -> Observed<Moments> {
    match (self.mean(), self.std_dev()) {
      (Some(mean), Some(std_dev)) => Observed::Defined(Moments { mean, std_dev }),
      _ => Observed::Unavailable,
    }
  }
}

/// When the running samples start over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
  /// Start over whenever the experiment id changes.
  #[default]
  PerExperiment,
  /// One sample across the whole walk.
  Global,
}

impl FromStr for ResetPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "per-experiment" => Ok(Self::PerExperiment),
      "global" => Ok(Self::Global),
      other => Err(format!("expected per-experiment|global, got {:?}", other)),
    }
  }
}

impl fmt::Display for ResetPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::PerExperiment => "per-experiment",
      Self::Global => "global",
    })
  }
}

/// Running samples at some point of the walk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CumulativeStats {
  pub experiment_id: Option<u32>,
  pub precision: RunningStats,
  pub cycle_time: RunningStats,
}

impl CumulativeStats {
  /// Fold one run into the samples and describe the row.
  ///
  /// An unavailable value leaves its sample untouched and makes that row's
  /// cumulative fields unavailable too.
  pub fn observe(self, row: &RunResult, policy: ResetPolicy) -> (Self, CumulativeRow) {
    let base = match policy {
      ResetPolicy::PerExperiment if self.experiment_id != Some(row.experiment_id) => Self::default(),
      _ => self,
    };

    let (precision, cumulative_precision) = advance(base.precision, row.precision);
    let (cycle_time, cumulative_cycle_time) = advance(base.cycle_time, row.cycle_time);

    let next = Self {
      experiment_id: Some(row.experiment_id),
      precision,
      cycle_time,
    };
    let out = CumulativeRow {
      result: *row,
      cumulative_precision,
      cumulative_cycle_time,
    };
    (next, out)
  }
}

fn advance(stats: RunningStats, value: Observed<f64>) -> (RunningStats, Observed<Moments>) {
  match value {
    Observed::Defined(x) => {
      let next = stats.push(x);
      (next, next.moments())
    }
    Observed::Unavailable => (stats, Observed::Unavailable),
  }
}

/// One output row per input row, in input order.
///
/// Callers supply rows ascending by experiment, then in run order; the result
/// depends on that order.
pub fn compute_cumulative(rows: &[RunResult], policy: ResetPolicy) -> Vec<CumulativeRow> {
  rows
    .iter()
    .scan(CumulativeStats::default(), |state, row| {
      let (next, out) = state.observe(row, policy);
      *state = next;
      Some(out)
    })
    .collect()
}

pub fn render_cumulative(rows: &[CumulativeRow]) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", CUMULATIVE_HEADER);
  for row in rows {
    let precision = row.cumulative_precision;
    let cycle = row.cumulative_cycle_time;
    let _ = writeln!(
      out,
      "{};{};{};{};{}",
      point_values(&row.result),
      precision.map(|m| m.mean),
      precision.map(|m| m.std_dev),
      cycle.map(|m| m.mean),
      cycle.map(|m| m.std_dev),
    );
  }
  out
}
