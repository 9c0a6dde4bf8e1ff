use ropey::{
  Rope,
  RopeSlice,
};

#[cfg(target_os = "windows")]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::Crlf;

#[cfg(not(target_os = "windows"))]
pub const NATIVE_LINE_ENDING: LineEnding = LineEnding::LF;

/// Line endings recognized by the buffer. Only LF and CRLF split lines.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineEnding {
  /// CarriageReturn followed by LineFeed.
  Crlf,

  /// U+000A -- LineFeed
  LF,
}

impl LineEnding {
  #[inline]
  pub const fn len_chars(&self) -> usize {
    match self {
      Self::Crlf => 2,
      Self::LF => 1,
    }
  }

  #[inline]
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Crlf => "\u{000D}\u{000A}",
      Self::LF => "\u{000A}",
    }
  }

  #[inline]
  pub const fn from_char(ch: char) -> Option<LineEnding> {
    match ch {
      '\u{000A}' => Some(LineEnding::LF),
      _ => None,
    }
  }
}

/// Attempts to detect what line ending the passed document uses.
///
/// Only the first 100 lines are inspected.
pub fn auto_detect_line_ending(doc: &Rope) -> Option<LineEnding> {
  doc.lines().take(100).find_map(|line| get_line_ending(&line))
}

/// Returns the passed line's line ending, if any.
pub fn get_line_ending(line: &RopeSlice) -> Option<LineEnding> {
  let len = line.len_chars();
  if len == 0 || line.char(len - 1) != '\u{000A}' {
    return None;
  }
  if len >= 2 && line.char(len - 2) == '\u{000D}' {
    Some(LineEnding::Crlf)
  } else {
    Some(LineEnding::LF)
  }
}

/// Returns the char index of the end of the given line, not including its line
/// ending.
pub fn line_end_char_index(slice: &RopeSlice, line: usize) -> usize {
  slice.line_to_char(line + 1)
    - get_line_ending(&slice.line(line))
      .map(|le| le.len_chars())
      .unwrap_or(0)
}

/// Get line `line_idx` from the passed rope slice, sans any line ending.
pub fn line_without_line_ending<'a>(slice: &RopeSlice<'a>, line_idx: usize) -> RopeSlice<'a> {
  let start = slice.line_to_char(line_idx);
  let end = line_end_char_index(slice, line_idx);
  slice.slice(start..end)
}

/// Number of editable lines in `doc`.
///
/// A final line ending terminates the last line instead of opening a new one,
/// and the empty document still has a single empty line.
pub fn editable_line_count(doc: &Rope) -> usize {
  let lines = doc.len_lines();
  if lines > 1 && doc.line(lines - 1).len_chars() == 0 {
    lines - 1
  } else {
    lines
  }
}
