//! Line-addressed text buffer seam.
//!
//! The annotation engine never owns the document. It edits whatever the host
//! provides through [`TextBuffer`], using 1-based line numbers throughout,
//! the same numbering analyzers report.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
  #[error("line {line} is out of range for a buffer of {len} lines")]
  LineOutOfRange { line: usize, len: usize },
  #[error("line text must not contain a line ending")]
  EmbeddedLineEnding,
  #[error("buffer is readonly")]
  Readonly,
}

pub type Result<T> = std::result::Result<T, BufferError>;

/// Cursor location: 1-based line, 0-based char column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub line:   usize,
  pub column: usize,
}

impl Position {
  pub const fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }
}

impl Default for Position {
  fn default() -> Self {
    Self::new(1, 0)
  }
}

pub trait TextBuffer {
  /// Number of lines. Never zero: an empty buffer has one empty line.
  fn line_count(&self) -> usize;

  /// Content of `line`, without its line ending.
  fn line(&self, line: usize) -> Result<Cow<'_, str>>;

  fn replace_line(&mut self, line: usize, text: &str) -> Result<()>;

  /// Insert `text` as a new line directly above `line`, pushing `line` and
  /// everything below it down by one. `line_count() + 1` appends.
  fn insert_line_before(&mut self, line: usize, text: &str) -> Result<()>;

  fn delete_line(&mut self, line: usize) -> Result<()>;

  /// 1-based line holding the cursor.
  fn cursor_line(&self) -> usize;

  /// Start a group of edits undone as one unit. Groups may nest; only the
  /// outermost pair delimits the unit.
  fn begin_undo_group(&mut self);

  fn end_undo_group(&mut self);
}

/// Run `edit` inside a single undo group. The group is closed even when
/// `edit` fails.
pub fn with_undo_group<B, T, E>(
  buffer: &mut B,
  edit: impl FnOnce(&mut B) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
  B: TextBuffer + ?Sized,
{
  buffer.begin_undo_group();
  let result = edit(buffer);
  buffer.end_undo_group();
  result
}

/// Validate a 1-based `line` against `len` lines.
pub(crate) fn check_line(line: usize, len: usize) -> Result<usize> {
  if line == 0 || line > len {
    return Err(BufferError::LineOutOfRange { line, len });
  }
  Ok(line - 1)
}
