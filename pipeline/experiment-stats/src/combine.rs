//! Merge experiments into one table of (experiment, run, precision, cycle time).

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::conformance::{capture_number, PRECISION};
use crate::summary::{CYCLE_TIME, SEPARATOR};
use crate::types::*;

static RUN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Run (\d+):").expect("static regex"));

pub const COMBINED_HEADER: &str = "Experiment;Run;Precision;Average_Product_Cycle_Time_Seconds";

/// Rows of all experiments, ascending by experiment id, runs in summary order.
pub fn combine_experiments(summaries: &[ExperimentSummary]) -> Vec<RunResult> {
  let mut ordered: Vec<&ExperimentSummary> = summaries.iter().collect();
  ordered.sort_by_key(|s| s.experiment_id);
  ordered.into_iter().flat_map(|s| s.results()).collect()
}

/// Recover rows from an already rendered experiment report.
///
/// Blocks without a `Run N:` marker are skipped. A block without a precision
/// or cycle-time value still yields a row, with that field unavailable.
pub fn parse_report(experiment_id: u32, text: &str) -> Vec<RunResult> {
  let separator = format!("{}\n", SEPARATOR);
  text
    .split(separator.as_str())
    .filter_map(|block| {
      let run_id = RUN_NUMBER
        .captures(block)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())?;
      Some(RunResult {
        experiment_id,
        run_id,
        precision: capture_number(&PRECISION, block),
        cycle_time: capture_number(&CYCLE_TIME, block),
      })
    })
    .collect()
}

/// One row per run: precision to 4 decimals, cycle time to 2, `N/A` when unavailable.
pub fn render_combined(rows: &[RunResult]) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", COMBINED_HEADER);
  for row in rows {
    let _ = writeln!(out, "{}", point_values(row));
  }
  out
}

pub(crate) fn point_values(row: &RunResult) -> String {
  format!(
    "{};{};{:.4};{:.2}",
    row.experiment_id, row.run_id, row.precision, row.cycle_time
  )
}
