//! Indicator extraction: per-case cycle time and per-vehicle utilization.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use regex::{Regex, RegexBuilder};

use crate::config::IndicatorConfig;
use crate::error::LogError;
use crate::types::*;

/// Seconds with microsecond resolution.
pub fn seconds(delta: TimeDelta) -> f64 {
  match delta.num_microseconds() {
    Some(us) => us as f64 / 1_000_000.0,
    None => delta.num_milliseconds() as f64 / 1_000.0,
  }
}

/// Duration of one case from its earliest start marker to its latest end marker.
///
/// `None` when either marker is absent. Negative durations are passed through.
pub fn extract_case_duration(trace: &Trace, start_activity: &str, end_activity: &str) -> Option<f64> {
  let start = marker_times(trace, start_activity).min()?;
  let end = marker_times(trace, end_activity).max()?;
  Some(seconds(end - start))
}

fn marker_times<'a>(trace: &'a Trace, activity: &'a str) -> impl Iterator<Item = DateTime<Utc>> + 'a {
  trace
    .events
    .iter()
    .filter(move |e| e.activity == activity)
    .map(|e| e.timestamp)
}

/// Mean cycle time over the cases that have both markers.
pub fn average_cycle_time(log: &EventLog, start_activity: &str, end_activity: &str) -> CycleTimeSummary {
  let durations: Vec<f64> = log
    .traces
    .iter()
    .filter_map(|t| extract_case_duration(t, start_activity, end_activity))
    .collect();

  let average_seconds = if durations.is_empty() {
    None
  } else {
    Some(durations.iter().sum::<f64>() / durations.len() as f64)
  };

  CycleTimeSummary {
    cases: log.traces.len(),
    measured: durations.len(),
    average_seconds,
  }
}

/// Case-insensitive matcher for vehicle activities.
#[derive(Debug, Clone)]
pub struct VehicleActivities(Regex);

impl VehicleActivities {
  pub fn new(pattern: &str) -> Result<Self, LogError> {
    Ok(Self(RegexBuilder::new(pattern).case_insensitive(true).build()?))
  }

  pub fn matches(&self, activity: &str) -> bool {
    self.0.is_match(activity)
  }
}

/// Per-vehicle active span relative to the whole log's time span.
pub fn extract_utilization(log: &EventLog, vehicles: &VehicleActivities) -> UtilizationOutcome {
  let mut spans: BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>)> = BTreeMap::new();
  for event in log.events().filter(|e| vehicles.matches(&e.activity)) {
    spans
      .entry(event.resource_id.as_str())
      .and_modify(|(lo, hi)| {
        *lo = (*lo).min(event.timestamp);
        *hi = (*hi).max(event.timestamp);
      })
      .or_insert((event.timestamp, event.timestamp));
  }

  if spans.is_empty() {
    return UtilizationOutcome::NoVehicleEvents;
  }

  // Span of the unfiltered log, not of the vehicle events.
  let total = match log.time_span() {
    Some((lo, hi)) => seconds(hi - lo),
    None => 0.0,
  };
  if total == 0.0 {
    return UtilizationOutcome::ZeroTimeSpan;
  }

  let resources: Vec<ResourceUtilization> = spans
    .into_iter()
    .map(|(id, (lo, hi))| {
      let active_seconds = seconds(hi - lo);
      ResourceUtilization {
        resource_id: id.to_string(),
        active_seconds,
        rate: active_seconds / total,
      }
    })
    .collect();
  let average_rate = resources.iter().map(|r| r.rate).sum::<f64>() / resources.len() as f64;

  UtilizationOutcome::Computed(UtilizationSummary {
    total_span_seconds: total,
    average_rate,
    resources,
  })
}

/// Cycle time and utilization for one log.
pub fn extract(log: &EventLog, config: &IndicatorConfig, vehicles: &VehicleActivities) -> LogIndicators {
  LogIndicators {
    cycle_time: average_cycle_time(log, &config.start_activity, &config.end_activity),
    utilization: extract_utilization(log, vehicles),
  }
}
