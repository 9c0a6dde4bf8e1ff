//! Rope-backed text buffer with batch-level undo.
//!
//! [`Document`] is the buffer provider the annotation engine works against
//! when no editor is involved: it implements [`TextBuffer`] over a
//! [`Rope`], keeps a cursor and selection, and records one history revision
//! per outermost undo group.
//!
//! # Lines
//!
//! Lines are addressed 1-based. A final line ending terminates the last line
//! rather than opening an empty one, so `"a\nb\n"` has two lines and the empty
//! document has one. Inserted lines take the document's line ending, detected
//! from the text when it is loaded.
//!
//! # Example
//!
//! ```no_run
//! use lintmark_lib::{
//!   buffer::TextBuffer,
//!   document::Document,
//! };
//! use ropey::Rope;
//!
//! let mut doc = Document::new(Rope::from("x = 1\n"));
//! doc.begin_undo_group();
//! doc.insert_line_before(1, "# note").unwrap();
//! doc.end_undo_group();
//! assert_eq!(*doc.text(), "# note\nx = 1\n");
//!
//! assert!(doc.undo());
//! assert_eq!(*doc.text(), "x = 1\n");
//! ```

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
};

use lintmark_core::{
  chars::char_is_line_ending,
  line_ending::{
    LineEnding,
    NATIVE_LINE_ENDING,
    auto_detect_line_ending,
    editable_line_count,
    get_line_ending,
    line_end_char_index,
    line_without_line_ending,
  },
};
use ropey::Rope;

use crate::{
  buffer::{
    BufferError,
    Position,
    Result,
    TextBuffer,
    check_line,
  },
  history::{
    History,
    HistoryJump,
    State,
  },
  search::{
    self,
    SearchFacility,
    SearchParams,
  },
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentFlags {
  pub readonly: bool,
  pub modified: bool,
}

/// Selected text, from `anchor` to `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
  pub anchor: Position,
  pub head:   Position,
}

#[derive(Debug)]
pub struct Document {
  path:        Option<PathBuf>,
  text:        Rope,
  cursor:      Position,
  selection:   Option<Span>,
  history:     History,
  /// Snapshot taken when the outermost undo group opened.
  old_state:   Option<State>,
  group_depth: usize,
  line_ending: LineEnding,
  flags:       DocumentFlags,
  search:      SearchParams,
}

impl Document {
  pub fn new(text: Rope) -> Self {
    let line_ending = auto_detect_line_ending(&text).unwrap_or(NATIVE_LINE_ENDING);
    let cursor = Position::default();
    Self {
      path: None,
      history: History::new(),
      text,
      cursor,
      selection: None,
      old_state: None,
      group_depth: 0,
      line_ending,
      flags: DocumentFlags::default(),
      search: SearchParams::default(),
    }
  }

  pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.path = Some(path.into());
    self
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn line_ending(&self) -> LineEnding {
    self.line_ending
  }

  pub fn flags(&self) -> DocumentFlags {
    self.flags
  }

  pub fn set_readonly(&mut self, readonly: bool) {
    self.flags.readonly = readonly;
  }

  pub fn mark_saved(&mut self) {
    self.flags.modified = false;
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  pub fn cursor(&self) -> Position {
    self.cursor
  }

  /// Move the cursor, clamped into the document, and clear the selection.
  pub fn set_cursor(&mut self, cursor: Position) {
    self.cursor = self.clamp_position(cursor);
    self.selection = None;
  }

  pub fn selection(&self) -> Option<Span> {
    self.selection
  }

  pub fn set_selection(&mut self, anchor: Position, head: Position) {
    let anchor = self.clamp_position(anchor);
    let head = self.clamp_position(head);
    self.cursor = head;
    self.selection = Some(Span { anchor, head });
  }

  fn clamp_position(&self, position: Position) -> Position {
    let line = position.line.clamp(1, self.line_count());
    let text = self.text.slice(..);
    let width = line_without_line_ending(&text, line - 1).len_chars();
    Position::new(line, position.column.min(width))
  }

  fn ensure_writable(&self) -> Result<()> {
    if self.flags.readonly {
      return Err(BufferError::Readonly);
    }
    Ok(())
  }

  fn check_text(text: &str) -> Result<()> {
    if text.contains(char_is_line_ending) {
      return Err(BufferError::EmbeddedLineEnding);
    }
    Ok(())
  }

  fn touched(&mut self) {
    self.flags.modified = true;
    // Edits shift lines under the cursor; keep it inside the text.
    self.cursor = self.clamp_position(self.cursor);
    self.selection = None;
  }

  fn snapshot(&self) -> State {
    State {
      doc:    self.text.clone(),
      cursor: self.cursor,
    }
  }

  /// Undo the most recent batch. Returns `false` when there is nothing to
  /// undo.
  pub fn undo(&mut self) -> bool {
    match self.history.undo() {
      Some(jump) => self.apply_history_jump(jump),
      None => false,
    }
  }

  pub fn redo(&mut self) -> bool {
    match self.history.redo() {
      Some(jump) => self.apply_history_jump(jump),
      None => false,
    }
  }

  fn apply_history_jump(&mut self, jump: HistoryJump) -> bool {
    if self.history.apply_jump(&jump).is_err() {
      return false;
    }
    self.text = jump.state.doc;
    self.cursor = jump.state.cursor;
    self.selection = None;
    self.old_state = None;
    self.group_depth = 0;
    self.flags.modified = true;
    true
  }
}

impl TextBuffer for Document {
  fn line_count(&self) -> usize {
    editable_line_count(&self.text)
  }

  fn line(&self, line: usize) -> Result<Cow<'_, str>> {
    let idx = check_line(line, self.line_count())?;
    let text = self.text.slice(..);
    Ok(line_without_line_ending(&text, idx).into())
  }

  fn replace_line(&mut self, line: usize, text: &str) -> Result<()> {
    self.ensure_writable()?;
    Self::check_text(text)?;
    let idx = check_line(line, self.line_count())?;
    let slice = self.text.slice(..);
    let start = slice.line_to_char(idx);
    let end = line_end_char_index(&slice, idx);
    self.text.remove(start..end);
    self.text.insert(start, text);
    self.touched();
    Ok(())
  }

  fn insert_line_before(&mut self, line: usize, text: &str) -> Result<()> {
    self.ensure_writable()?;
    Self::check_text(text)?;
    let count = self.line_count();
    let idx = check_line(line, count + 1)?;
    let ending = self.line_ending.as_str();

    if idx == count {
      // Appending: terminate the current last line first if it is open.
      let last = self.text.line(count - 1);
      let at = self.text.len_chars();
      if get_line_ending(&last).is_none() {
        self.text.insert(at, &format!("{ending}{text}"));
      } else {
        self.text.insert(at, &format!("{text}{ending}"));
      }
    } else {
      let at = self.text.line_to_char(idx);
      self.text.insert(at, &format!("{text}{ending}"));
    }
    self.touched();
    Ok(())
  }

  fn delete_line(&mut self, line: usize) -> Result<()> {
    self.ensure_writable()?;
    let count = self.line_count();
    let idx = check_line(line, count)?;
    let start = self.text.line_to_char(idx);
    let end = self.text.line_to_char(idx + 1);

    if idx + 1 == count && idx > 0 && get_line_ending(&self.text.line(idx)).is_none() {
      // The last line has no terminator: take the previous line's instead.
      let prev_end = line_end_char_index(&self.text.slice(..), idx - 1);
      self.text.remove(prev_end..end);
    } else {
      self.text.remove(start..end);
    }
    self.touched();
    Ok(())
  }

  fn cursor_line(&self) -> usize {
    self.cursor.line
  }

  fn begin_undo_group(&mut self) {
    if self.group_depth == 0 {
      self.old_state = Some(self.snapshot());
    }
    self.group_depth += 1;
  }

  fn end_undo_group(&mut self) {
    if self.group_depth == 0 {
      return;
    }
    self.group_depth -= 1;
    if self.group_depth > 0 {
      return;
    }
    let Some(before) = self.old_state.take() else {
      return;
    };
    if before.doc == self.text {
      return;
    }
    let after = self.snapshot();
    self.history.commit_revision(before, after);
  }
}

impl SearchFacility for Document {
  fn params(&self) -> SearchParams {
    self.search.clone()
  }

  fn set_params(&mut self, params: SearchParams) {
    self.search = params;
  }

  fn find_next(&mut self) -> search::Result<bool> {
    // The cursor sits on the start of the previous match, which find_match
    // skips, so repeated calls advance.
    match search::find_match(&*self, self.cursor, &self.search)? {
      Some(found) => {
        self.set_selection(found.start_position(), found.end_position());
        self.cursor = found.start_position();
        Ok(true)
      },
      None => Ok(false),
    }
  }
}
