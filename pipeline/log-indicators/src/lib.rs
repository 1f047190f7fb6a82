//! Simulation event-log indicator engine. Deterministic, batch.
//!
//! Reads delimited simulator records, groups them into cases, builds an
//! event log, and derives product cycle time and vehicle utilization.
//!
//! Process discovery and conformance checking live outside this crate.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod normalize;
pub mod report;
pub mod types;

pub use config::IndicatorConfig;
pub use engine::{BatchEntry, Engine, FileOutcome};
pub use error::LogError;
pub use types::{EventLog, EventRecord, LogIndicators, Trace};
