//! Rendering annotation records into buffer lines.
//!
//! An annotation line is the target line's indentation, the marker, then
//! the text. [`format_line`] turns every record anchored at one target line
//! into the order the engine inserts them in.

use std::path::PathBuf;

use lintmark_core::chars::{
  leading_run,
  trim_indent,
};

pub const DEFAULT_MARKER: &str = "# lintcheck: ";

pub const DEFAULT_INDENT_CHAR: char = ' ';

/// How annotation lines look in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationStyle {
  pub marker:      String,
  pub indent_char: char,
}

impl Default for AnnotationStyle {
  fn default() -> Self {
    Self {
      marker:      DEFAULT_MARKER.to_string(),
      indent_char: DEFAULT_INDENT_CHAR,
    }
  }
}

impl AnnotationStyle {
  pub fn new(marker: impl Into<String>, indent_char: char) -> Self {
    Self {
      marker: marker.into(),
      indent_char,
    }
  }

  /// Whether `line` is owned by the engine: after its leading whitespace it
  /// starts with the marker.
  pub fn is_annotation(&self, line: &str) -> bool {
    !self.marker.is_empty() && trim_indent(line).starts_with(&self.marker)
  }

  pub fn leading_indent(&self, line: &str) -> usize {
    leading_run(line, self.indent_char)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
  /// First physical line of a message, carrying the code prefix.
  Head,
  Continuation,
}

/// One physical annotation line, before indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
  pub file:   PathBuf,
  pub line:   usize,
  pub column: usize,
  pub text:   String,
  pub part:   Part,
}

/// A rendered annotation waiting to be inserted above `target_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLine {
  pub target_line:   usize,
  pub indent:        usize,
  pub text:          String,
  pub source_column: usize,
  pub part:          Part,
}

impl AnnotationLine {
  /// The annotation without indentation, as compared by the idempotence
  /// check.
  pub fn content(&self, marker: &str) -> String {
    format!("{marker}{}", self.text)
  }

  pub fn render(&self, marker: &str, indent_char: char) -> String {
    let mut line = String::with_capacity(self.indent + marker.len() + self.text.len());
    line.extend(std::iter::repeat_n(indent_char, self.indent));
    line.push_str(marker);
    line.push_str(&self.text);
    line
  }
}

/// Order the records of one target line for insertion.
///
/// Every line is meant to be inserted at the same position directly above
/// `target_line`, so each insertion lands on top of the previous ones. The
/// returned order makes the final block read messages in ascending column
/// order, ties in arrival order, each message head first. Each message is a
/// contiguous run ending with its head.
pub fn format_line(
  target_line: usize,
  records: &[AnnotationRecord],
  indent: usize,
) -> Vec<AnnotationLine> {
  let mut sorted: Vec<&AnnotationRecord> = records.iter().collect();
  sorted.sort_by_key(|record| record.column);

  // A message is its continuation lines (already last-first) closed by its
  // head.
  let mut messages: Vec<Vec<&AnnotationRecord>> = Vec::new();
  let mut current = Vec::new();
  for record in sorted {
    current.push(record);
    if record.part == Part::Head {
      messages.push(std::mem::take(&mut current));
    }
  }
  if !current.is_empty() {
    messages.push(current);
  }

  messages
    .into_iter()
    .rev()
    .flatten()
    .map(|record| {
      AnnotationLine {
        target_line,
        indent,
        text: record.text.clone(),
        source_column: record.column,
        part: record.part,
      }
    })
    .collect()
}
