//! Parse delimited simulator output and normalize rows into canonical EventRecords.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::error::LogError;
use crate::types::*;

/// Cell values that count as missing.
const NULL_TOKENS: [&str; 13] = [
  "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

const NAIVE_FORMATS: [&str; 4] = [
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
  "%d-%m-%Y %H:%M:%S",
];

pub fn is_null(value: &str) -> bool {
  NULL_TOKENS.contains(&value.trim())
}

/// Split a delimited text into header-keyed rows.
///
/// Fails when the header is missing or lacks a required column.
pub fn parse_table(text: &str, delimiter: char) -> Result<Vec<RawRecord>, LogError> {
  let mut records = split_records(text, delimiter).into_iter();
  let header = match records.next() {
    Some(h) => h,
    None => return Err(LogError::parse("input has no header row")),
  };
  check_columns(&header)?;

  let rows = records
    .enumerate()
    .map(|(i, cells)| {
      let fields = header
        .iter()
        .cloned()
        .zip(cells.into_iter().chain(std::iter::repeat(String::new())))
        .collect::<HashMap<_, _>>();
      RawRecord { line: i + 1, fields }
    })
    .collect();
  Ok(rows)
}

/// Ensure every required column is declared.
pub fn check_columns(header: &[String]) -> Result<(), LogError> {
  for required in columns::REQUIRED {
    if !header.iter().any(|h| h == required) {
      return Err(LogError::MissingColumn(required.to_string()));
    }
  }
  Ok(())
}

/// Normalize one row.
///
/// Returns `Ok(None)` when the case key is missing (the row is not part of any case).
pub fn normalize(raw: &RawRecord) -> Result<Option<EventRecord>, LogError> {
  let case_key = match raw.get(columns::PRODUCT_NR).map(str::trim) {
    Some(k) if !is_null(k) => k.to_string(),
    _ => return Ok(None),
  };

  let timestamp_text = raw.get(columns::TIMESTAMP).unwrap_or_default();
  let timestamp = parse_timestamp(timestamp_text).ok_or_else(|| {
    LogError::validation(
      columns::TIMESTAMP,
      &format!("unparseable timestamp {:?}", timestamp_text),
    )
  })?;

  let unique_text = raw.get(columns::UNIQUE_ID).unwrap_or_default().trim();
  let unique_id = parse_integer(unique_text).ok_or_else(|| {
    LogError::validation(
      columns::UNIQUE_ID,
      &format!("expected integer, got {:?}", unique_text),
    )
  })?;

  let decay_text = raw.get(columns::DECAY_LEVEL).unwrap_or_default().trim();
  let decay_level = if is_null(decay_text) {
    None
  } else {
    Some(decay_text.parse::<f64>().map_err(|e| {
      LogError::validation(columns::DECAY_LEVEL, &format!("{:?}: {}", decay_text, e))
    })?)
  };

  Ok(Some(EventRecord {
    case_key,
    activity: text(raw, columns::EVENT),
    timestamp,
    lifecycle: "complete".into(),
    product_type: text(raw, columns::PRODUCT_TYPE),
    vehicle_type: text(raw, columns::VEHICLE_TYPE),
    resource_id: text_or_na(raw, columns::VEHICLE),
    unique_id,
    decay_level,
    processing_station: text_or_na(raw, columns::PROCESSING_STATION),
    product_id_str: text(raw, columns::PRODUCT_ID_STR),
    product_id: text(raw, columns::PRODUCT_ID),
  }))
}

/// Parse RFC 3339 or one of the common naive layouts (taken as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in NAIVE_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Integers may arrive float-formatted ("12.0") from upstream tools.
fn parse_integer(s: &str) -> Option<i64> {
  if let Ok(v) = s.parse::<i64>() {
    return Some(v);
  }
  let f = s.parse::<f64>().ok()?;
  // 2^63 is exact in f64; anything at or past it would saturate.
  let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
  (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn text(raw: &RawRecord, column: &str) -> String {
  raw.get(column).unwrap_or_default().trim().to_string()
}

fn text_or_na(raw: &RawRecord, column: &str) -> String {
  match raw.get(column).map(str::trim) {
    Some(v) if !is_null(v) => v.to_string(),
    _ => NOT_AVAILABLE.to_string(),
  }
}

#[derive(Default)]
struct Cell {
  text: String,
  quoted: bool,
  in_quotes: bool,
}

impl Cell {
  fn finish(self) -> String {
    if self.quoted {
      self.text
    } else {
      self.text.trim().to_string()
    }
  }
}

/// Split delimited text into records of cells.
///
/// A cell wrapped in double quotes may hold the delimiter or a line break, and
/// `""` inside it is a literal quote. Unquoted cells are trimmed. Blank records
/// are skipped.
fn split_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
  let mut records = Vec::new();
  let mut record = Vec::new();
  let mut cell = Cell::default();
  let mut chars = text.chars().peekable();

  while let Some(c) = chars.next() {
    if cell.in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          cell.text.push('"');
        }
        '"' => cell.in_quotes = false,
        _ => cell.text.push(c),
      }
      continue;
    }
    match c {
      c if c == delimiter => record.push(std::mem::take(&mut cell).finish()),
      '\n' => {
        record.push(std::mem::take(&mut cell).finish());
        push_record(&mut records, std::mem::take(&mut record));
      }
      '\r' => {}
      '"' if !cell.quoted && cell.text.trim().is_empty() => {
        cell.text.clear();
        cell.quoted = true;
        cell.in_quotes = true;
      }
      // Padding after a closing quote.
      c if cell.quoted && c.is_whitespace() => {}
      c => cell.text.push(c),
    }
  }
  if cell.quoted || !cell.text.is_empty() || !record.is_empty() {
    record.push(cell.finish());
    push_record(&mut records, record);
  }
  records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
  if record.iter().any(|c| !c.is_empty()) {
    records.push(record);
  }
}
