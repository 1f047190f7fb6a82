//! The study runner: experiments 1..=N, runs 1..=M, reports and tables on disk.

use std::fs;
use std::io::ErrorKind;

use log_indicators::Engine;
use tracing::{info, warn};

use crate::combine::{combine_experiments, parse_report, render_combined};
use crate::config::StudyConfig;
use crate::conformance::ConformanceSource;
use crate::error::StatsError;
use crate::stats::{compute_cumulative, render_cumulative};
use crate::summary::{summarize_experiment, CycleTimeSource, RawLogDir};
use crate::types::*;

/// What a study wrote, kept for callers that want the values.
#[derive(Debug, Clone)]
pub struct StudyOutput {
  pub rows: Vec<RunResult>,
  pub cumulative: Vec<CumulativeRow>,
}

pub struct Study {
  config: StudyConfig,
}

impl Study {
  pub fn new(config: StudyConfig) -> Result<Self, StatsError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &StudyConfig {
    &self.config
  }

  /// Cycle times computed in memory from the raw input directory.
  pub fn raw_log_source(&self) -> Result<RawLogDir, StatsError> {
    let engine = Engine::new(self.config.indicators.clone())?;
    Ok(RawLogDir::new(&self.config.raw_input_dir, engine))
  }

  /// Summaries of experiments `1..=num_experiments`, in order.
  pub fn summaries(
    &self,
    conformance: &dyn ConformanceSource,
    cycle_times: &dyn CycleTimeSource,
  ) -> Vec<ExperimentSummary> {
    (1..=self.config.num_experiments)
      .map(|e| summarize_experiment(e, self.config.num_runs, conformance, cycle_times))
      .collect()
  }

  /// Write every experiment report, then both tables from the in-memory values.
  pub fn write_reports(&self, summaries: &[ExperimentSummary]) -> Result<StudyOutput, StatsError> {
    fs::create_dir_all(&self.config.summary_dir)?;
    for summary in summaries {
      let path = self.config.summary_path(summary.experiment_id);
      fs::write(&path, summary.render())?;
      info!(file = %path.display(), "experiment report written");
    }
    self.write_tables(combine_experiments(summaries))
  }

  /// Rows recovered from the experiment reports already on disk.
  ///
  /// A missing report is logged and skipped.
  pub fn rows_from_reports(&self) -> Result<Vec<RunResult>, StatsError> {
    let mut rows = Vec::new();
    for experiment_id in 1..=self.config.num_experiments {
      let path = self.config.summary_path(experiment_id);
      let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => {
          warn!(experiment = experiment_id, file = %path.display(), "summary file not found");
          continue;
        }
        Err(e) => return Err(e.into()),
      };
      rows.extend(parse_report(experiment_id, &text));
    }
    Ok(rows)
  }

  /// Write the combined table and the table with cumulative statistics.
  pub fn write_tables(&self, rows: Vec<RunResult>) -> Result<StudyOutput, StatsError> {
    fs::create_dir_all(&self.config.summary_dir)?;

    let combined = self.config.combined_path();
    fs::write(&combined, render_combined(&rows))?;
    info!(file = %combined.display(), rows = rows.len(), "combined results written");

    let cumulative = compute_cumulative(&rows, self.config.reset);
    let with_stats = self.config.cumulative_path();
    fs::write(&with_stats, render_cumulative(&cumulative))?;
    info!(file = %with_stats.display(), reset = %self.config.reset, "cumulative statistics written");

    Ok(StudyOutput { rows, cumulative })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_experiments_is_rejected() {
    let config = StudyConfig {
      num_experiments: 0,
      ..StudyConfig::default()
    };
    assert!(matches!(Study::new(config), Err(StatsError::Validation { .. })));
  }

  #[test]
  fn bad_vehicle_pattern_surfaces_as_indicator_error() {
    let mut config = StudyConfig::default();
    config.indicators.vehicle_activity_pattern = "(".into();
    let study = Study::new(config).unwrap();
    assert!(matches!(study.raw_log_source(), Err(StatsError::Indicators(_))));
  }

  #[test]
  fn missing_reports_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let study = Study::new(StudyConfig {
      num_experiments: 2,
      num_runs: 1,
      summary_dir: dir.path().to_path_buf(),
      ..StudyConfig::default()
    })
    .unwrap();
    fs::write(
      study.config().summary_path(2),
      "Experiment 2 Overview\nRun 1:\nMetrics: File not found\n",
    )
    .unwrap();

    let rows = study.rows_from_reports().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].experiment_id, 2);
  }
}
