//! Normalized analyzer findings.
//!
//! Analyzers hand back loosely typed records ([`RawDiagnostic`]). A
//! [`DiagnosticCollector`] accumulates them and validates each one into a
//! [`DiagnosticRecord`], dropping the records that are missing required
//! fields so one bad entry never spoils the batch.

use std::path::{
  Path,
  PathBuf,
};

use lintmark_core::path::absolutize;
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::Tendril;

#[derive(Debug, Error)]
pub enum DiagnosticError {
  #[error("diagnostic is missing required field `{0}`")]
  MissingField(&'static str),
  #[error("diagnostic line {0} is not a positive line number")]
  InvalidLine(i64),
  #[error("diagnostic column {0} is negative")]
  InvalidColumn(i64),
  #[error("analyzer report is not a JSON array of diagnostics: {0}")]
  Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DiagnosticError>;

/// One analyzer finding, anchored to a 1-based line of an absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
  pub file_path:  PathBuf,
  pub line:       usize,
  pub column:     usize,
  pub column_end: Option<usize>,
  pub identifier: Tendril,
  pub symbol:     Tendril,
  pub message:    String,
}

impl DiagnosticRecord {
  pub fn new(
    file_path: impl Into<PathBuf>,
    line: usize,
    column: usize,
    message: impl Into<String>,
  ) -> Self {
    Self {
      file_path: file_path.into(),
      line,
      column,
      column_end: None,
      identifier: Tendril::new(),
      symbol: Tendril::new(),
      message: message.into(),
    }
  }

  pub fn with_code(mut self, symbol: &str, identifier: &str) -> Self {
    self.symbol = symbol.into();
    self.identifier = identifier.into();
    self
  }

  pub fn with_column_end(mut self, column_end: usize) -> Self {
    self.column_end = Some(column_end.max(self.column));
    self
  }

  /// Prefix placed before the first physical line of the message.
  pub fn head(&self) -> String {
    format!("{} ({}): ", self.symbol, self.identifier)
  }
}

/// A diagnostic as reported by the analyzer, before validation.
///
/// Accepts both reporter field names (`abspath`, `msg`, `msg_id`) and the
/// field names of pylint's JSON report (`path`, `message`, `message-id`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDiagnostic {
  #[serde(default, alias = "path")]
  pub abspath:    Option<String>,
  #[serde(default)]
  pub line:       Option<i64>,
  #[serde(default)]
  pub column:     Option<i64>,
  #[serde(default, alias = "endColumn")]
  pub end_column: Option<i64>,
  #[serde(default, alias = "message")]
  pub msg:        Option<String>,
  #[serde(default, alias = "message-id")]
  pub msg_id:     Option<String>,
  #[serde(default)]
  pub symbol:     Option<String>,
}

impl RawDiagnostic {
  /// Validate into a [`DiagnosticRecord`]. Relative paths are resolved
  /// against `base_dir`.
  pub fn into_record(self, base_dir: &Path) -> Result<DiagnosticRecord> {
    let path = self
      .abspath
      .filter(|path| !path.is_empty())
      .ok_or(DiagnosticError::MissingField("abspath"))?;
    let line = self.line.ok_or(DiagnosticError::MissingField("line"))?;
    if line < 1 {
      return Err(DiagnosticError::InvalidLine(line));
    }
    let column = self.column.unwrap_or(0);
    if column < 0 {
      return Err(DiagnosticError::InvalidColumn(column));
    }
    let message = self.msg.ok_or(DiagnosticError::MissingField("msg"))?;

    let mut record = DiagnosticRecord::new(
      absolutize(path, base_dir),
      line as usize,
      column as usize,
      message,
    )
    .with_code(
      self.symbol.as_deref().unwrap_or_default(),
      self.msg_id.as_deref().unwrap_or_default(),
    );
    if let Some(end) = self.end_column.filter(|end| *end >= 0) {
      record = record.with_column_end(end as usize);
    }
    Ok(record)
  }
}

/// Parse an analyzer JSON report (an array of objects).
///
/// Entries whose fields have the wrong JSON type are kept as empty records so
/// the collector can count them as malformed.
pub fn parse_report(json: &str) -> Result<Vec<RawDiagnostic>> {
  let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
  Ok(
    values
      .into_iter()
      .map(|value| {
        serde_json::from_value(value).unwrap_or_else(|err| {
          tracing::warn!(%err, "analyzer report entry has unexpected field types");
          RawDiagnostic::default()
        })
      })
      .collect(),
  )
}

/// Diagnostics accumulated from one analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
  pub records: Vec<DiagnosticRecord>,
  pub dropped: usize,
}

/// Accumulates analyzer callbacks into an ordered list of records.
#[derive(Debug)]
pub struct DiagnosticCollector {
  base_dir:  PathBuf,
  collected: Collected,
}

impl DiagnosticCollector {
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir:  base_dir.into(),
      collected: Collected::default(),
    }
  }

  pub fn handle(&mut self, raw: RawDiagnostic) {
    match raw.into_record(&self.base_dir) {
      Ok(record) => self.collected.records.push(record),
      Err(err) => {
        tracing::warn!(%err, "dropping malformed diagnostic");
        self.collected.dropped += 1;
      },
    }
  }

  pub fn finish(self) -> Collected {
    self.collected
  }
}

impl Extend<RawDiagnostic> for DiagnosticCollector {
  fn extend<T: IntoIterator<Item = RawDiagnostic>>(&mut self, iter: T) {
    for raw in iter {
      self.handle(raw);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(path: &str, line: i64, msg: &str) -> RawDiagnostic {
    RawDiagnostic {
      abspath: Some(path.into()),
      line: Some(line),
      column: Some(4),
      msg: Some(msg.into()),
      msg_id: Some("W0612".into()),
      symbol: Some("unused-variable".into()),
      ..Default::default()
    }
  }

  #[test]
  fn collector_drops_malformed_records() {
    let mut collector = DiagnosticCollector::new("/work");
    collector.extend([
      raw("/work/a.py", 2, "unused variable x"),
      RawDiagnostic {
        msg: Some("no path".into()),
        line: Some(1),
        ..Default::default()
      },
      raw("/work/a.py", 0, "line zero"),
      raw("b.py", 7, "relative"),
    ]);
    let collected = collector.finish();

    assert_eq!(collected.dropped, 2);
    assert_eq!(collected.records.len(), 2);
    assert_eq!(collected.records[0].line, 2);
    assert_eq!(collected.records[0].head(), "unused-variable (W0612): ");
    assert_eq!(collected.records[1].file_path, PathBuf::from("/work/b.py"));
  }

  #[test]
  fn missing_column_defaults_to_zero() {
    let record = RawDiagnostic {
      abspath: Some("/a.py".into()),
      line: Some(3),
      msg: Some("m".into()),
      ..Default::default()
    }
    .into_record(Path::new("/"))
    .unwrap();
    assert_eq!(record.column, 0);
    assert_eq!(record.head(), " (): ");
  }

  #[test]
  fn negative_column_is_malformed() {
    let mut bad = raw("/a.py", 1, "m");
    bad.column = Some(-1);
    assert!(matches!(
      bad.into_record(Path::new("/")),
      Err(DiagnosticError::InvalidColumn(-1))
    ));
  }

  #[test]
  fn column_end_never_precedes_column() {
    let mut early = raw("/a.py", 1, "m");
    early.end_column = Some(1);
    let record = early.into_record(Path::new("/")).unwrap();
    assert_eq!(record.column_end, Some(4));
  }

  #[test]
  fn parses_pylint_json_report() {
    let json = r#"[
      {
        "type": "warning",
        "module": "a",
        "obj": "f",
        "line": 2,
        "column": 4,
        "endLine": 2,
        "endColumn": 5,
        "path": "/work/a.py",
        "symbol": "unused-variable",
        "message": "Unused variable 'x'",
        "message-id": "W0612"
      },
      { "line": "two", "path": "/work/a.py" }
    ]"#;
    let raws = parse_report(json).unwrap();
    assert_eq!(raws.len(), 2);
    assert_eq!(raws[0].msg_id.as_deref(), Some("W0612"));
    assert_eq!(raws[0].end_column, Some(5));
    assert_eq!(raws[1], RawDiagnostic::default());

    let mut collector = DiagnosticCollector::new("/work");
    collector.extend(raws);
    let collected = collector.finish();
    assert_eq!(collected.records.len(), 1);
    assert_eq!(collected.dropped, 1);
  }

  #[test]
  fn report_must_be_an_array() {
    assert!(matches!(
      parse_report("{}"),
      Err(DiagnosticError::Report(_))
    ));
  }
}
