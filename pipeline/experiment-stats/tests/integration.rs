//! Integration tests for the aggregation stage.

use std::fs;
use std::path::Path;

use experiment_stats::conformance::MetricsDir;
use experiment_stats::summary::{KpiDir, RawLogDir};
use experiment_stats::types::Moments;
use experiment_stats::{Observed, ResetPolicy, Study, StudyConfig};
use log_indicators::types::columns;
use log_indicators::Engine;

fn study_in(root: &Path, experiments: u32, runs: u32) -> Study {
  Study::new(StudyConfig {
    num_experiments: experiments,
    num_runs: runs,
    raw_input_dir: root.join("raw"),
    kpi_dir: root.join("kpi"),
    conformance_dir: root.join("conformance"),
    summary_dir: root.join("summaries"),
    ..StudyConfig::default()
  })
  .unwrap()
}

fn write_metrics(root: &Path, stem: &str, fitness: &str, precision: &str) {
  let dir = root.join("conformance");
  fs::create_dir_all(&dir).unwrap();
  fs::write(
    dir.join(format!("{}_metrics.txt", stem)),
    format!(
      "Fitness (Token-Based Replay): {}%\nPrecision (Token-Based Replay): {}\n",
      fitness, precision
    ),
  )
  .unwrap();
}

fn write_kpi(root: &Path, stem: &str, seconds: &str) {
  let dir = root.join("kpi");
  fs::create_dir_all(&dir).unwrap();
  fs::write(
    dir.join(format!("{}.txt", stem)),
    format!(
      "Average Product Cycle Time: {} seconds\nAverage Resource Utilization Rate (Vehicles): 0.5000\n",
      seconds
    ),
  )
  .unwrap();
}

fn write_raw(root: &Path, stem: &str, start: &str, end: &str) {
  let dir = root.join("raw");
  fs::create_dir_all(&dir).unwrap();
  let mut text = columns::REQUIRED.join("\t");
  text.push('\n');
  for (id, event, ts, vehicle) in [
    ("1", "productCallsForTransportRegion1", start, ""),
    ("2", "pickedUpRegion1", start, "V1"),
    ("3", "droppedOffRegion3", end, "V1"),
  ] {
    text.push_str(&[id, "1", event, ts, "A", "AGV", vehicle, "0", "", "P1", "1"].join("\t"));
    text.push('\n');
  }
  fs::write(dir.join(format!("{}.txt", stem)), text).unwrap();
}

#[test]
fn missing_precision_keeps_running_sample() {
  let root = tempfile::tempdir().unwrap();
  let root = root.path();
  write_metrics(root, "Exp1Run1", "100.00", "0.8342");
  write_kpi(root, "Exp1Run1", "120.00");
  write_kpi(root, "Exp1Run2", "180.00");

  let study = study_in(root, 1, 2);
  let conformance = MetricsDir::new(root.join("conformance"));
  let kpis = KpiDir::new(root.join("kpi"));
  let output = study
    .write_reports(&study.summaries(&conformance, &kpis))
    .unwrap();

  assert_eq!(output.rows.len(), 2);
  assert_eq!(output.rows[1].precision, Observed::Unavailable);
  assert_eq!(
    output.cumulative[0].cumulative_precision,
    Observed::Defined(Moments { mean: 0.8342, std_dev: 0.0 })
  );
  assert_eq!(output.cumulative[1].cumulative_precision, Observed::Unavailable);

  let report = fs::read_to_string(study.config().summary_path(1)).unwrap();
  assert!(report.contains("Run 2:\nMetrics: File not found\nProduct Cycle Time:\nAverage Product Cycle Time: 180.00 seconds\n"));

  let combined = fs::read_to_string(study.config().combined_path()).unwrap();
  assert_eq!(
    combined,
    "Experiment;Run;Precision;Average_Product_Cycle_Time_Seconds\n1;1;0.8342;120.00\n1;2;N/A;180.00\n"
  );

  let with_stats = fs::read_to_string(study.config().cumulative_path()).unwrap();
  let lines: Vec<_> = with_stats.lines().collect();
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[1], "1;1;0.8342;120.00;0.8342;0;120;0");
  assert!(lines[2].starts_with("1;2;N/A;180.00;N/A;N/A;150;42.426406871"));
}

#[test]
fn combine_from_reports_matches_in_memory_rows() {
  let root = tempfile::tempdir().unwrap();
  let root = root.path();
  for (stem, precision, seconds) in [
    ("Exp1Run1", "0.9000", "100.00"),
    ("Exp1Run2", "0.8000", "300.00"),
    ("Exp2Run1", "0.7500", "250.50"),
  ] {
    write_metrics(root, stem, "95.00", precision);
    write_kpi(root, stem, seconds);
  }

  let study = study_in(root, 3, 2);
  let conformance = MetricsDir::new(root.join("conformance"));
  let kpis = KpiDir::new(root.join("kpi"));
  let written = study
    .write_reports(&study.summaries(&conformance, &kpis))
    .unwrap();

  let reread = study.rows_from_reports().unwrap();
  assert_eq!(reread, written.rows);
  assert_eq!(reread.len(), 6);

  let keys: Vec<_> = reread.iter().map(|r| (r.experiment_id, r.run_id)).collect();
  assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]);

  // Experiment 3 has no artifacts at all: its rows stay, fully unavailable.
  assert!(reread[4..]
    .iter()
    .all(|r| r.precision == Observed::Unavailable && r.cycle_time == Observed::Unavailable));

  // Tables rebuilt from reports are byte-identical to the in-memory ones.
  let combined = fs::read_to_string(study.config().combined_path()).unwrap();
  let stats = fs::read_to_string(study.config().cumulative_path()).unwrap();
  study.write_tables(reread).unwrap();
  assert_eq!(fs::read_to_string(study.config().combined_path()).unwrap(), combined);
  assert_eq!(fs::read_to_string(study.config().cumulative_path()).unwrap(), stats);
}

#[test]
fn reset_policy_changes_cross_experiment_statistics() {
  let root = tempfile::tempdir().unwrap();
  let root = root.path();
  write_metrics(root, "Exp1Run1", "100.00", "0.2000");
  write_metrics(root, "Exp2Run1", "100.00", "0.6000");

  let conformance = MetricsDir::new(root.join("conformance"));
  let kpis = KpiDir::new(root.join("kpi"));

  let per_experiment = study_in(root, 2, 1);
  let out = per_experiment
    .write_reports(&per_experiment.summaries(&conformance, &kpis))
    .unwrap();
  assert_eq!(out.cumulative[1].cumulative_precision.value().unwrap().mean, 0.6);

  let global = Study::new(StudyConfig {
    reset: ResetPolicy::Global,
    ..per_experiment.config().clone()
  })
  .unwrap();
  let out = global
    .write_reports(&global.summaries(&conformance, &kpis))
    .unwrap();
  let m = out.cumulative[1].cumulative_precision.value().unwrap();
  assert!((m.mean - 0.4).abs() < 1e-12);
}

#[test]
fn study_mode_computes_cycle_time_from_raw_input() {
  let root = tempfile::tempdir().unwrap();
  let root = root.path();
  write_metrics(root, "Exp1Run1", "100.00", "0.9500");
  write_raw(root, "Exp1Run1", "2024-10-25 08:00:00", "2024-10-25 08:02:30");
  write_raw(root, "Exp1Run2", "2024-10-25 09:00:00", "2024-10-25 09:01:00");

  let study = study_in(root, 1, 3);
  let conformance = MetricsDir::new(root.join("conformance"));
  let raw = RawLogDir::new(root.join("raw"), Engine::with_defaults().unwrap());
  let output = study
    .write_reports(&study.summaries(&conformance, &raw))
    .unwrap();

  assert_eq!(output.rows[0].cycle_time, Observed::Defined(150.0));
  assert_eq!(output.rows[1].cycle_time, Observed::Defined(60.0));
  assert_eq!(output.rows[2].cycle_time, Observed::Unavailable);

  let report = fs::read_to_string(study.config().summary_path(1)).unwrap();
  assert!(report.contains("Average Product Cycle Time: 150.00 seconds"));
  assert!(report.contains("Run 3:\nMetrics: File not found\nProduct Cycle Time: File not found\n"));
}

#[test]
fn negative_cycle_time_survives_report_round_trip() {
  let root = tempfile::tempdir().unwrap();
  let root = root.path();
  write_metrics(root, "Exp1Run1", "100.00", "0.9000");
  // End marker one minute before the start marker.
  write_raw(root, "Exp1Run1", "2024-10-25 09:01:00", "2024-10-25 09:00:00");
  write_raw(root, "Exp1Run2", "2024-10-25 10:00:00", "2024-10-25 10:00:30");

  let study = study_in(root, 1, 2);
  let conformance = MetricsDir::new(root.join("conformance"));
  let raw = study.raw_log_source().unwrap();
  let written = study
    .write_reports(&study.summaries(&conformance, &raw))
    .unwrap();
  assert_eq!(written.rows[0].cycle_time, Observed::Defined(-60.0));

  let report = fs::read_to_string(study.config().summary_path(1)).unwrap();
  assert!(report.contains("Average Product Cycle Time: -60.00 seconds"));

  let combined = fs::read_to_string(study.config().combined_path()).unwrap();
  let stats = fs::read_to_string(study.config().cumulative_path()).unwrap();
  let reread = study.rows_from_reports().unwrap();
  assert_eq!(reread, written.rows);
  study.write_tables(reread).unwrap();
  assert_eq!(fs::read_to_string(study.config().combined_path()).unwrap(), combined);
  assert_eq!(fs::read_to_string(study.config().cumulative_path()).unwrap(), stats);
}
