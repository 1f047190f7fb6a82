//! Boundary to the external discovery / conformance-checking step.
//!
//! The scores are consumed as-is; nothing here recomputes or second-guesses
//! them. A run the collaborator could not score is reported, not fatal.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::types::*;

static FITNESS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"Fitness \(Token-Based Replay\): ([0-9.]+)%").expect("static regex"));
pub(crate) static PRECISION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"Precision \(Token-Based Replay\): ([0-9.]+)").expect("static regex"));

/// Supplies the conformance scores of a run, or `None` when there are none.
pub trait ConformanceSource {
  fn scores(&self, key: RunKey) -> Option<MetricsArtifact>;
}

/// Any closure over run keys can stand in for the collaborator.
impl<F> ConformanceSource for F
where
  F: Fn(RunKey) -> Option<MetricsArtifact>,
{
  fn scores(&self, key: RunKey) -> Option<MetricsArtifact> {
    self(key)
  }
}

impl MetricsArtifact {
  /// Wrap scores handed over in memory, rendering the usual metrics text.
  pub fn from_scores(fitness_pct: f64, precision: f64) -> Self {
    let scores = ConformanceScores {
      fitness_pct: Observed::finite(fitness_pct),
      precision: Observed::finite(precision),
    };
    let text = format!(
      "Fitness (Token-Based Replay): {:.2}%\nPrecision (Token-Based Replay): {:.4}",
      scores.fitness_pct, scores.precision
    );
    Self { text, scores }
  }

  /// Read a metrics file body. Lines that don't carry a readable value leave it unavailable.
  pub fn parse(text: &str) -> Self {
    Self {
      text: text.trim().to_string(),
      scores: ConformanceScores {
        fitness_pct: capture_number(&FITNESS, text),
        precision: capture_number(&PRECISION, text),
      },
    }
  }
}

pub(crate) fn capture_number(pattern: &Regex, text: &str) -> Observed<f64> {
  pattern
    .captures(text)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse::<f64>().ok())
    .map_or(Observed::Unavailable, Observed::finite)
}

/// Metrics files `Exp{e}Run{r}_metrics.txt` written by the discovery step.
#[derive(Debug, Clone)]
pub struct MetricsDir {
  pub dir: PathBuf,
}

impl MetricsDir {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }
}

impl ConformanceSource for MetricsDir {
  fn scores(&self, key: RunKey) -> Option<MetricsArtifact> {
    let path = self.dir.join(key.metrics_file_name());
    match fs::read_to_string(&path) {
      Ok(text) => Some(MetricsArtifact::parse(&text)),
      Err(e) if e.kind() == ErrorKind::NotFound => {
        warn!(file = %path.display(), "metrics file not found");
        None
      }
      Err(e) => {
        warn!(file = %path.display(), error = %e, "metrics file unreadable");
        None
      }
    }
  }
}
