//! Partitioning diagnostics by file and by line.

use std::{
  collections::BTreeMap,
  path::PathBuf,
};

use smallvec::SmallVec;

use crate::{
  diagnostic::DiagnosticRecord,
  format::{
    AnnotationRecord,
    Part,
  },
};

pub type FileGroups = BTreeMap<PathBuf, Vec<AnnotationRecord>>;

pub type LineGroup = BTreeMap<usize, SmallVec<[AnnotationRecord; 4]>>;

/// Split every diagnostic into one record per physical message line and
/// partition them by file.
///
/// The lines of a message are stored last first, because the engine inserts
/// them one by one at the same position. Only the record of the first
/// physical line is a [`Part::Head`] and carries the `symbol (identifier): `
/// prefix.
pub fn group_by_file(diagnostics: &[DiagnosticRecord]) -> FileGroups {
  let mut groups = FileGroups::new();
  for diagnostic in diagnostics {
    let records = groups.entry(diagnostic.file_path.clone()).or_default();
    records.extend(split_message(diagnostic));
  }
  groups
}

fn split_message(diagnostic: &DiagnosticRecord) -> impl Iterator<Item = AnnotationRecord> + '_ {
  let mut lines: Vec<&str> = diagnostic.message.lines().collect();
  if lines.is_empty() {
    lines.push("");
  }
  lines.into_iter().enumerate().rev().map(move |(idx, text)| {
    let (text, part) = if idx == 0 {
      (format!("{}{text}", diagnostic.head()), Part::Head)
    } else {
      (text.to_string(), Part::Continuation)
    };
    // A lone carriage return would split the annotation in the buffer.
    let text = if text.contains('\r') {
      text.replace('\r', " ")
    } else {
      text
    };
    AnnotationRecord {
      file: diagnostic.file_path.clone(),
      line: diagnostic.line,
      column: diagnostic.column,
      text,
      part,
    }
  })
}

/// Partition one file's records by target line.
///
/// Records pointing past the end of a `line_count`-line buffer are anchored
/// at `fallback_line` instead, itself clamped into the buffer.
pub fn group_by_line(
  records: impl IntoIterator<Item = AnnotationRecord>,
  line_count: usize,
  fallback_line: usize,
) -> LineGroup {
  let line_count = line_count.max(1);
  let fallback = fallback_line.clamp(1, line_count);
  let mut groups = LineGroup::new();
  for mut record in records {
    if record.line > line_count || record.line == 0 {
      tracing::warn!(
        file = %record.file.display(),
        line = record.line,
        line_count,
        fallback,
        "annotation target is out of range, anchoring at the cursor line"
      );
      record.line = fallback;
    }
    groups.entry(record.line).or_default().push(record);
  }
  groups
}
