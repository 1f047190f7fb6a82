//! Core engine: input file -> event log -> indicators -> KPI report.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::builder;
use crate::config::IndicatorConfig;
use crate::error::LogError;
use crate::indicators::{self, VehicleActivities};
use crate::normalize;
use crate::report;
use crate::types::*;

/// Everything derived from one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
  pub file: String,
  pub build: BuildReport,
  pub indicators: LogIndicators,
  #[serde(skip)]
  pub log: EventLog,
}

/// Outcome of one file in a directory batch. A failed file never stops the batch.
#[derive(Debug)]
pub struct BatchEntry {
  pub input: PathBuf,
  pub result: Result<FileOutcome, LogError>,
}

pub struct Engine {
  config: IndicatorConfig,
  vehicles: VehicleActivities,
}

impl Engine {
  pub fn new(config: IndicatorConfig) -> Result<Self, LogError> {
    let vehicles = VehicleActivities::new(&config.vehicle_activity_pattern)?;
    Ok(Self { config, vehicles })
  }

  pub fn with_defaults() -> Result<Self, LogError> {
    Self::new(IndicatorConfig::default())
  }

  pub fn config(&self) -> &IndicatorConfig {
    &self.config
  }

  /// Process the contents of one delimited input file.
  pub fn process_text(&self, name: &str, text: &str) -> Result<FileOutcome, LogError> {
    let rows = normalize::parse_table(text, self.config.delimiter)?;
    let (log, build) = builder::build_from_rows(&rows);
    if build.dropped_missing_case > 0 {
      info!(file = name, dropped = build.dropped_missing_case, "rows without case key dropped");
    }

    let indicators = indicators::extract(&log, &self.config, &self.vehicles);
    match &indicators.utilization {
      UtilizationOutcome::NoVehicleEvents => {
        warn!(file = name, "no vehicle events found, utilization skipped")
      }
      UtilizationOutcome::ZeroTimeSpan => {
        warn!(file = name, "total time span is zero, utilization skipped")
      }
      UtilizationOutcome::Computed(_) => {}
    }
    if indicators.cycle_time.average_seconds.is_none() {
      warn!(file = name, cases = log.traces.len(), "no case has both start and end markers");
    }

    Ok(FileOutcome {
      file: name.to_string(),
      build,
      indicators,
      log,
    })
  }

  pub fn process_file(&self, path: &Path) -> Result<FileOutcome, LogError> {
    let text = fs::read_to_string(path)?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    self.process_text(&name, &text)
  }

  /// Process every `*.txt` file of `input` in file-name order.
  ///
  /// Writes `<stem>.txt` KPI reports into `output` and, when `log_dir` is set,
  /// `<stem>.json` event logs into it.
  pub fn process_dir(
    &self,
    input: &Path,
    output: &Path,
    log_dir: Option<&Path>,
  ) -> Result<Vec<BatchEntry>, LogError> {
    fs::create_dir_all(output)?;
    if let Some(dir) = log_dir {
      fs::create_dir_all(dir)?;
    }

    let mut inputs: Vec<PathBuf> = fs::read_dir(input)?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
      .collect();
    inputs.sort();

    let entries = inputs
      .into_iter()
      .map(|path| {
        info!(file = %path.display(), "processing");
        let result = self
          .process_file(&path)
          .and_then(|outcome| self.write_outputs(&path, &outcome, output, log_dir).map(|_| outcome));
        if let Err(e) = &result {
          warn!(file = %path.display(), error = %e, "file skipped");
        }
        BatchEntry { input: path, result }
      })
      .collect();
    Ok(entries)
  }

  fn write_outputs(
    &self,
    input: &Path,
    outcome: &FileOutcome,
    output: &Path,
    log_dir: Option<&Path>,
  ) -> Result<(), LogError> {
    let stem = input
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .ok_or_else(|| LogError::parse(format!("no file stem in {}", input.display())))?;

    let kpi_path = output.join(format!("{}.txt", stem));
    fs::write(&kpi_path, report::render(&outcome.indicators))?;
    info!(file = %kpi_path.display(), "KPI report written");

    if let Some(dir) = log_dir {
      let log_path = dir.join(format!("{}.json", stem));
      fs::write(&log_path, serde_json::to_vec_pretty(&outcome.log)?)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::columns;

  fn input(rows: &[[&str; 5]]) -> String {
    // productNr, event, timeStamp, vehicle, uniqueID
    let mut text = columns::REQUIRED.join("\t");
    text.push('\n');
    for [nr, event, ts, vehicle, id] in rows {
      let line = [*id, *nr, *event, *ts, "A", "AGV", *vehicle, "0.1", "S1", "P", *nr].join("\t");
      text.push_str(&line);
      text.push('\n');
    }
    text
  }

  #[test]
  fn process_text_end_to_end() {
    let engine = Engine::with_defaults().unwrap();
    let text = input(&[
      ["1", "productCallsForTransportRegion1", "2024-10-25 08:00:00", "", "1"],
      ["1", "assignedToVehicle", "2024-10-25 08:00:10", "V1", "2"],
      ["1", "pickedUpRegion1", "2024-10-25 08:01:00", "V1", "3"],
      ["", "orphan", "2024-10-25 08:01:30", "V9", "4"],
      ["1", "droppedOffRegion3", "2024-10-25 08:02:00", "V1", "5"],
    ]);
    let outcome = engine.process_text("Exp1Run1.txt", &text).unwrap();
    assert_eq!(outcome.build.rows, 5);
    assert_eq!(outcome.build.dropped_missing_case, 1);
    assert_eq!(outcome.log.traces.len(), 1);
    assert_eq!(outcome.indicators.cycle_time.average_seconds, Some(120.0));

    let u = outcome.indicators.utilization.summary().unwrap();
    assert_eq!(u.resources.len(), 1);
    assert!((u.resources[0].rate - 110.0 / 120.0).abs() < 1e-12);
  }

  #[test]
  fn invalid_rows_are_counted_not_fatal() {
    let engine = Engine::with_defaults().unwrap();
    let text = input(&[
      ["1", "productCallsForTransportRegion1", "garbage", "", "1"],
      ["1", "droppedOffRegion3", "2024-10-25 08:02:00", "V1", "x"],
      ["1", "droppedOffRegion3", "2024-10-25 08:02:00", "V1", "3"],
    ]);
    let outcome = engine.process_text("f.txt", &text).unwrap();
    assert_eq!(outcome.build.dropped_invalid, 2);
    assert_eq!(outcome.log.event_count(), 1);
    assert_eq!(outcome.indicators.cycle_time.average_seconds, None);
  }

  #[test]
  fn bad_pattern_fails_construction() {
    let config = IndicatorConfig {
      vehicle_activity_pattern: "[".into(),
      ..IndicatorConfig::default()
    };
    assert!(Engine::new(config).is_err());
  }
}
