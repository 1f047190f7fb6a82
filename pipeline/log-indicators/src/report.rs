//! Plain-text KPI report, one per input file.

use std::fmt::Write;

use crate::types::{LogIndicators, UtilizationOutcome};

pub const CYCLE_TIME_LABEL: &str = "Average Product Cycle Time";

/// First report line; `N/A` when no case had both markers.
pub fn cycle_time_line(average_seconds: Option<f64>) -> String {
  match average_seconds {
    Some(s) => format!("{}: {:.2} seconds", CYCLE_TIME_LABEL, s),
    None => format!("{}: N/A", CYCLE_TIME_LABEL),
  }
}

/// Render the full report. The utilization block is left out when it was skipped.
pub fn render(indicators: &LogIndicators) -> String {
  let mut out = cycle_time_line(indicators.cycle_time.average_seconds);
  out.push('\n');

  if let UtilizationOutcome::Computed(u) = &indicators.utilization {
    let _ = writeln!(
      out,
      "Average Resource Utilization Rate (Vehicles): {:.4}\n",
      u.average_rate
    );
    out.push_str("Utilization Time and Rate for each vehicle:\n");
    for r in &u.resources {
      let _ = writeln!(
        out,
        "Vehicle {}: Utilization Time: {:.2} seconds, Utilization Rate: {:.4}",
        r.resource_id, r.active_seconds, r.rate
      );
    }
  }
  out
}
