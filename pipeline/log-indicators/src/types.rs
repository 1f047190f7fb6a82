//! Core types for the indicator engine (input rows, event-log model, indicator outputs).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Input rows (what the simulator writes)
// ---------------------------------------------------------------------------

/// One data row of a delimited input file, keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
  /// 1-based data row number (header excluded), for diagnostics.
  pub line: usize,
  pub fields: HashMap<String, String>,
}

impl RawRecord {
  pub fn get(&self, column: &str) -> Option<&str> {
    self.fields.get(column).map(|s| s.as_str())
  }
}

/// Column names of the simulator output.
pub mod columns {
  pub const UNIQUE_ID: &str = "uniqueID";
  pub const PRODUCT_NR: &str = "productNr";
  pub const EVENT: &str = "event";
  pub const TIMESTAMP: &str = "timeStamp";
  pub const PRODUCT_TYPE: &str = "productType";
  pub const VEHICLE_TYPE: &str = "vehicleType";
  pub const VEHICLE: &str = "vehicle";
  pub const DECAY_LEVEL: &str = "currentDecayLevel";
  pub const PROCESSING_STATION: &str = "processingStation";
  pub const PRODUCT_ID_STR: &str = "productIDStr";
  pub const PRODUCT_ID: &str = "productID";

  /// Every column an input file must declare.
  pub const REQUIRED: [&str; 11] = [
    UNIQUE_ID,
    PRODUCT_NR,
    EVENT,
    TIMESTAMP,
    PRODUCT_TYPE,
    VEHICLE_TYPE,
    VEHICLE,
    DECAY_LEVEL,
    PROCESSING_STATION,
    PRODUCT_ID_STR,
    PRODUCT_ID,
  ];
}

/// Placeholder for an absent resource or processing station.
pub const NOT_AVAILABLE: &str = "NA";

// ---------------------------------------------------------------------------
// Event-log model
// ---------------------------------------------------------------------------

/// Canonical event after normalization + validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
  pub case_key: String,
  pub activity: String,
  pub timestamp: DateTime<Utc>,
  pub lifecycle: String,
  pub product_type: String,
  pub vehicle_type: String,
  pub resource_id: String,
  pub unique_id: i64,
  pub decay_level: Option<f64>,
  pub processing_station: String,
  pub product_id_str: String,
  pub product_id: String,
}

/// All events of one case, in input row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
  pub case_id: String,
  pub events: Vec<EventRecord>,
}

/// A declared log extension (name, attribute prefix, definition URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
  pub name: String,
  pub prefix: String,
  pub uri: String,
}

/// A named event classifier. Descriptive only; nothing in the engine reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classifier {
  pub name: String,
  pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLog {
  pub name: String,
  pub extensions: Vec<Extension>,
  pub classifiers: Vec<Classifier>,
  pub traces: Vec<Trace>,
}

impl EventLog {
  /// All events, trace by trace.
  pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
    self.traces.iter().flat_map(|t| t.events.iter())
  }

  pub fn event_count(&self) -> usize {
    self.traces.iter().map(|t| t.events.len()).sum()
  }

  /// Earliest and latest timestamp over the whole log.
  pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut events = self.events();
    let first = events.next()?.timestamp;
    Some(events.fold((first, first), |(lo, hi), e| {
      (lo.min(e.timestamp), hi.max(e.timestamp))
    }))
  }
}

/// Rows dropped while building a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
  pub rows: usize,
  pub dropped_missing_case: usize,
  pub dropped_invalid: usize,
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleTimeSummary {
  /// Cases in the log.
  pub cases: usize,
  /// Cases that had both a start and an end marker.
  pub measured: usize,
  /// Mean duration in seconds over measured cases.
  pub average_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUtilization {
  pub resource_id: String,
  pub active_seconds: f64,
  pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSummary {
  pub total_span_seconds: f64,
  pub average_rate: f64,
  /// Ascending by resource id.
  pub resources: Vec<ResourceUtilization>,
}

/// Why utilization was or wasn't computed for a log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UtilizationOutcome {
  Computed(UtilizationSummary),
  NoVehicleEvents,
  ZeroTimeSpan,
}

impl UtilizationOutcome {
  pub fn summary(&self) -> Option<&UtilizationSummary> {
    match self {
      Self::Computed(s) => Some(s),
      _ => None,
    }
  }
}

/// Every indicator derived from one event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogIndicators {
  pub cycle_time: CycleTimeSummary,
  pub utilization: UtilizationOutcome,
}
