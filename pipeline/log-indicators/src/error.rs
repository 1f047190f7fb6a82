//! Structured error types for the indicator engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
  /// A required column is absent from the input header. Fatal for that file.
  #[error("missing column: {0}")]
  MissingColumn(String),

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("parse: {0}")]
  Parse(String),

  #[error("pattern: {0}")]
  Pattern(#[from] regex::Error),

  #[error("config: {0}")]
  Config(#[from] toml::de::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl LogError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }
}
