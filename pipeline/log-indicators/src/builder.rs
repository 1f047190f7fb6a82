//! Group normalized records into an event log, one trace per case.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::normalize;
use crate::types::*;

pub const LOG_NAME: &str = "XES Event Log";

/// Build an event log from records that already carry a case key.
///
/// Cases appear in the order their key is first seen; events keep input order.
pub fn build(records: Vec<EventRecord>) -> EventLog {
  let mut index: HashMap<String, usize> = HashMap::new();
  let mut traces: Vec<Trace> = Vec::new();

  for record in records {
    let slot = *index.entry(record.case_key.clone()).or_insert_with(|| {
      traces.push(Trace {
        case_id: record.case_key.clone(),
        events: Vec::new(),
      });
      traces.len() - 1
    });
    traces[slot].events.push(record);
  }

  EventLog {
    name: LOG_NAME.into(),
    extensions: standard_extensions(),
    classifiers: standard_classifiers(),
    traces,
  }
}

/// Normalize raw rows and build the log, dropping rows that cannot belong to a case.
pub fn build_from_rows(rows: &[RawRecord]) -> (EventLog, BuildReport) {
  let mut report = BuildReport {
    rows: rows.len(),
    ..BuildReport::default()
  };
  let mut records = Vec::with_capacity(rows.len());

  for raw in rows {
    match normalize::normalize(raw) {
      Ok(Some(record)) => records.push(record),
      Ok(None) => {
        debug!(line = raw.line, "row without case key dropped");
        report.dropped_missing_case += 1;
      }
      Err(e) => {
        debug!(line = raw.line, error = %e, "unusable row dropped");
        report.dropped_invalid += 1;
      }
    }
  }

  if report.dropped_invalid > 0 {
    warn!(
      dropped = report.dropped_invalid,
      rows = report.rows,
      "rows with unusable values were dropped"
    );
  }

  (build(records), report)
}

fn standard_extensions() -> Vec<Extension> {
  [
    ("Time", "time"),
    ("Lifecycle", "lifecycle"),
    ("Concept", "concept"),
    ("Organizational", "org"),
  ]
  .into_iter()
  .map(|(name, prefix)| Extension {
    name: name.into(),
    prefix: prefix.into(),
    uri: format!("http://www.xes-standard.org/{}.xesext", prefix),
  })
  .collect()
}

fn standard_classifiers() -> Vec<Classifier> {
  vec![
    Classifier {
      name: "Event Name".into(),
      keys: vec!["concept:name".into()],
    },
    Classifier {
      name: "(Event Name AND Lifecycle transition)".into(),
      keys: vec!["concept:name".into(), "lifecycle:transition".into()],
    },
  ]
}
