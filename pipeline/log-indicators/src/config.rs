//! Indicator configuration with the simulation study's defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::LogError;

/// Activity markers and input format for indicator extraction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
  /// Activity that opens a product case for cycle-time purposes.
  pub start_activity: String,
  /// Activity that closes a product case for cycle-time purposes.
  pub end_activity: String,
  /// Case-insensitive pattern selecting vehicle activities for utilization.
  pub vehicle_activity_pattern: String,
  /// Field delimiter of the raw input files.
  pub delimiter: char,
}

impl Default for IndicatorConfig {
  fn default() -> Self {
    Self {
      start_activity: "productCallsForTransportRegion1".into(),
      end_activity: "droppedOffRegion3".into(),
      vehicle_activity_pattern: "assignedToVehicle|pickedUp|droppedOff".into(),
      delimiter: '\t',
    }
  }
}

impl IndicatorConfig {
  /// Read a TOML file; keys that are absent keep their defaults.
  pub fn load(path: &Path) -> Result<Self, LogError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_toml(&text)
  }

  pub fn from_toml(text: &str) -> Result<Self, LogError> {
    Ok(toml::from_str(text)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let config = IndicatorConfig::from_toml(r#"end_activity = "droppedOffRegion2""#).unwrap();
    assert_eq!(config.end_activity, "droppedOffRegion2");
    assert_eq!(config.start_activity, "productCallsForTransportRegion1");
    assert_eq!(config.delimiter, '\t');
  }

  #[test]
  fn unknown_delimiter_string_is_rejected() {
    let err = IndicatorConfig::from_toml(r#"delimiter = ";;""#).unwrap_err();
    assert!(err.to_string().starts_with("config:"));
  }
}
