//! Study configuration: experiment grid, artifact directories, statistics policy.

use std::path::{Path, PathBuf};

use log_indicators::IndicatorConfig;
use serde::Deserialize;

use crate::error::StatsError;
use crate::stats::ResetPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
  /// Experiments are numbered `1..=num_experiments`.
  pub num_experiments: u32,
  /// Runs per experiment, numbered `1..=num_runs`.
  pub num_runs: u32,
  /// Raw simulator output, `Exp{e}Run{r}.txt`.
  pub raw_input_dir: PathBuf,
  /// KPI reports, `Exp{e}Run{r}.txt`.
  pub kpi_dir: PathBuf,
  /// Discovery / conformance output, `Exp{e}Run{r}_metrics.txt`.
  pub conformance_dir: PathBuf,
  /// Experiment reports and the combined tables.
  pub summary_dir: PathBuf,
  pub reset: ResetPolicy,
  /// Markers used when indicators are computed from raw input.
  pub indicators: IndicatorConfig,
}

impl Default for StudyConfig {
  fn default() -> Self {
    Self {
      num_experiments: 27,
      num_runs: 20,
      raw_input_dir: "01_raw_input".into(),
      kpi_dir: "03_event_logs_KPIs".into(),
      conformance_dir: "04_process_discovery_conformance".into(),
      summary_dir: "05_summaries_per_experiment".into(),
      reset: ResetPolicy::default(),
      indicators: IndicatorConfig::default(),
    }
  }
}

impl StudyConfig {
  /// Read a TOML file; keys that are absent keep their defaults.
  pub fn load(path: &Path) -> Result<Self, StatsError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_toml(&text)
  }

  pub fn from_toml(text: &str) -> Result<Self, StatsError> {
    let config: Self = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), StatsError> {
    if self.num_experiments == 0 {
      return Err(StatsError::validation("num_experiments", "must be at least 1"));
    }
    if self.num_runs == 0 {
      return Err(StatsError::validation("num_runs", "must be at least 1"));
    }
    Ok(())
  }

  pub fn summary_path(&self, experiment_id: u32) -> PathBuf {
    self
      .summary_dir
      .join(format!("Exp{}_summary.txt", experiment_id))
  }

  pub fn combined_path(&self) -> PathBuf {
    self.summary_dir.join("combined_results.txt")
  }

  pub fn cumulative_path(&self) -> PathBuf {
    self.summary_dir.join("combined_results_with_stats.txt")
  }
}
