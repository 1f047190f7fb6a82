//! Experiment and run aggregation with cumulative statistics. Deterministic, batch.
//!
//! Collects each run's conformance scores and cycle time, renders one report
//! per experiment, merges all experiments into one table, and walks the runs
//! in (experiment, run) order keeping a running mean and sample standard
//! deviation of precision and cycle time.
//!
//! Missing inputs become `N/A` in the output, never a failed batch.

pub mod combine;
pub mod config;
pub mod conformance;
pub mod error;
pub mod stats;
pub mod study;
pub mod summary;
pub mod types;

pub use config::StudyConfig;
pub use error::StatsError;
pub use stats::ResetPolicy;
pub use study::{Study, StudyOutput};
pub use types::{CumulativeRow, Observed, RunKey, RunResult};
