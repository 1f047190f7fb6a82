//! Structured error types for the aggregation stage.

use log_indicators::LogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("indicators: {0}")]
  Indicators(#[from] LogError),

  #[error("config: {0}")]
  Config(#[from] toml::de::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl StatsError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}
