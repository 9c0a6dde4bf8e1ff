//! Inserting and removing annotation lines.
//!
//! The [`Annotator`] applies a batch of diagnostics to a [`TextBuffer`] as one
//! undo group. Target lines are visited from the bottom of the buffer up, so
//! inserting above one target never shifts a target that is still pending.
//!
//! # Idempotence
//!
//! Messages are checked whole. Before inserting a message above target `T`,
//! the engine looks for its head line in the block of annotation lines
//! touching `T`: the run of marker lines directly above it and the run
//! starting at `T` itself, each at most `N` lines long, where `N` is the
//! number of records for `T` in this batch. A message whose head is already
//! present is skipped with all of its lines, so a message may repeat a line of
//! its own. This recognizes messages inserted earlier in the same batch, and
//! blocks left by a previous run when the new line numbers were taken from the
//! annotated text.
//!
//! When the batch repeats line numbers taken before a previous run shifted
//! the buffer, `T` no longer points at its source line. For that case the
//! whole annotation block above the `T`-th line that is not an annotation is
//! checked too.

use std::path::Path;

use lintmark_core::{
  chars::trim_indent,
  path::normalize,
};
use thiserror::Error;

use crate::{
  aggregate::add_foreign_file_pointers,
  buffer::{
    BufferError,
    TextBuffer,
    with_undo_group,
  },
  diagnostic::DiagnosticRecord,
  format::{
    AnnotationRecord,
    AnnotationStyle,
    Part,
    format_line,
  },
  group::{
    LineGroup,
    group_by_file,
    group_by_line,
  },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
  #[error(transparent)]
  Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Default)]
pub struct Annotator {
  style: AnnotationStyle,
}

impl Annotator {
  pub fn new(style: AnnotationStyle) -> Self {
    Self { style }
  }

  pub fn style(&self) -> &AnnotationStyle {
    &self.style
  }

  /// Insert annotations for the diagnostics of `target_file`.
  ///
  /// With `only_current_file`, every other file reported in `diagnostics`
  /// gets one pointer annotation in this buffer instead. Returns the target
  /// lines, ascending, that received at least one new annotation.
  pub fn annotate<B>(
    &self,
    buffer: &mut B,
    diagnostics: &[DiagnosticRecord],
    target_file: &Path,
    only_current_file: bool,
  ) -> Result<Vec<usize>>
  where
    B: TextBuffer + ?Sized,
  {
    let target = normalize(target_file);
    let mut groups = group_by_file(diagnostics);
    if only_current_file {
      add_foreign_file_pointers(&mut groups, &target, buffer.cursor_line());
    }

    let records = groups.remove(&target).unwrap_or_default();
    tracing::debug!(
      target = %target.display(),
      records = records.len(),
      other_files = groups.len(),
      "annotating"
    );
    self.insert_records(buffer, records)
  }

  /// Insert prepared records, each above its own line, as one undo group.
  /// Lines past the end of the buffer fall back to the cursor line.
  pub fn insert_records<B>(&self, buffer: &mut B, records: Vec<AnnotationRecord>) -> Result<Vec<usize>>
  where
    B: TextBuffer + ?Sized,
  {
    if records.is_empty() {
      return Ok(Vec::new());
    }
    let lines = group_by_line(records, buffer.line_count(), buffer.cursor_line());
    with_undo_group(buffer, |buffer| self.insert_lines(buffer, lines))
  }

  fn insert_lines<B>(&self, buffer: &mut B, lines: LineGroup) -> Result<Vec<usize>>
  where
    B: TextBuffer + ?Sized,
  {
    let marker = self.style.marker.as_str();
    let mut layout = Layout::scan(&*buffer, &self.style)?;
    let mut annotated = Vec::new();

    for (target_line, records) in lines.into_iter().rev() {
      let indent = self.style.leading_indent(&buffer.line(target_line)?);
      let window = records.len();
      let mut inserted = false;

      let formatted = format_line(target_line, &records, indent);
      for message in formatted.split_inclusive(|line| line.part == Part::Head) {
        let Some(head) = message.last() else {
          continue;
        };
        let source_row = layout.source_row(target_line);
        if self.already_present(&*buffer, target_line, window, source_row, &head.content(marker))? {
          tracing::debug!(target_line, column = head.source_column, "annotation already present");
          continue;
        }
        for line in message {
          buffer.insert_line_before(target_line, &line.render(marker, self.style.indent_char))?;
          layout.inserted.push(target_line);
        }
        inserted = true;
      }

      if inserted {
        annotated.push(target_line);
      }
    }

    annotated.reverse();
    Ok(annotated)
  }

  fn already_present<B>(
    &self,
    buffer: &B,
    target_line: usize,
    window: usize,
    source_row: Option<usize>,
    content: &str,
  ) -> Result<bool>
  where
    B: TextBuffer + ?Sized,
  {
    let count = buffer.line_count();
    let above = (target_line.saturating_sub(window).max(1)..target_line).rev();
    let below = target_line..(target_line + window).min(count + 1);
    let above_source = source_row
      .filter(|row| *row != target_line && *row <= count)
      .map(|row| (1..row).rev())
      .into_iter()
      .flatten();

    for rows in [above.collect::<Vec<_>>(), below.collect(), above_source.collect()] {
      for row in rows {
        let text = buffer.line(row)?;
        if !self.style.is_annotation(&text) {
          break;
        }
        if trim_indent(&text) == content {
          return Ok(true);
        }
      }
    }
    Ok(false)
  }

  /// Delete the annotation lines between `start_line` and `end_line`,
  /// inclusive. Returns whether anything was deleted.
  pub fn remove_in_selection<B>(&self, buffer: &mut B, start_line: usize, end_line: usize) -> Result<bool>
  where
    B: TextBuffer + ?Sized,
  {
    let count = buffer.line_count();
    let (start, end) = if start_line <= end_line {
      (start_line, end_line)
    } else {
      (end_line, start_line)
    };
    let start = start.clamp(1, count);
    let end = end.clamp(1, count);

    let mut rows = Vec::new();
    for row in start..=end {
      if self.style.is_annotation(&buffer.line(row)?) {
        rows.push(row);
      }
    }
    if rows.is_empty() {
      return Ok(false);
    }

    tracing::debug!(start, end, removed = rows.len(), "removing annotations");
    with_undo_group(buffer, |buffer| {
      for row in rows.into_iter().rev() {
        buffer.delete_line(row)?;
      }
      Ok(true)
    })
  }

  /// Delete every annotation line. The buffer is left untouched when there
  /// is none.
  pub fn remove_all<B>(&self, buffer: &mut B) -> Result<bool>
  where
    B: TextBuffer + ?Sized,
  {
    let count = buffer.line_count();
    self.remove_in_selection(buffer, 1, count)
  }
}

/// Rows of the lines that are not annotations, as of the start of a batch,
/// and the rows the batch has inserted at since.
struct Layout {
  plain_rows: Vec<usize>,
  inserted:   Vec<usize>,
}

impl Layout {
  fn scan<B>(buffer: &B, style: &AnnotationStyle) -> Result<Self>
  where
    B: TextBuffer + ?Sized,
  {
    let mut plain_rows = Vec::new();
    for row in 1..=buffer.line_count() {
      if !style.is_annotation(&buffer.line(row)?) {
        plain_rows.push(row);
      }
    }
    Ok(Self {
      plain_rows,
      inserted: Vec::new(),
    })
  }

  /// Current row of the `line`-th line that is not an annotation.
  fn source_row(&self, line: usize) -> Option<usize> {
    let mut row = *self.plain_rows.get(line.checked_sub(1)?)?;
    for &at in &self.inserted {
      if at <= row {
        row += 1;
      }
    }
    Some(row)
  }
}
