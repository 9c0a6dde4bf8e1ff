//! Pattern search over any [`TextBuffer`].
//!
//! [`SearchParams`] describes one search the way a find dialog would: the
//! pattern, whether it is a regex, case sensitivity, whole-word matching,
//! wrap-around and direction. [`find_match`] runs it line by line, starting
//! right after a cursor position, and [`SearchFacility`] is the seam the
//! annotation locator drives.
//!
//! # Matching rules
//!
//! - Matches never span lines, and `^`/`$` anchor to the line.
//! - The match starting exactly at the cursor is skipped, so repeated
//!   "find next" calls walk forward through the buffer.
//! - With `wrap`, the search continues from the other end of the buffer and
//!   finally revisits the cursor line up to the cursor.
//! - An empty pattern never matches.

use regex_automata::{
  Input,
  meta::Regex,
  util::syntax,
};
use thiserror::Error;

use crate::buffer::{
  BufferError,
  Position,
  TextBuffer,
};

#[derive(Debug, Error)]
pub enum SearchError {
  #[error("invalid search pattern `{pattern}`: {reason}")]
  InvalidPattern { pattern: String, reason: String },
  #[error(transparent)]
  Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
  Forward,
  Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
  pub pattern:        String,
  pub regex:          bool,
  pub case_sensitive: bool,
  pub whole_word:     bool,
  pub wrap:           bool,
  pub direction:      SearchDirection,
}

impl Default for SearchParams {
  fn default() -> Self {
    Self {
      pattern:        String::new(),
      regex:          false,
      case_sensitive: false,
      whole_word:     false,
      wrap:           true,
      direction:      SearchDirection::Forward,
    }
  }
}

/// A match on a single line; `start` and `end` are char columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
  pub line:  usize,
  pub start: usize,
  pub end:   usize,
}

impl SearchMatch {
  pub fn start_position(&self) -> Position {
    Position::new(self.line, self.start)
  }

  pub fn end_position(&self) -> Position {
    Position::new(self.line, self.end)
  }
}

/// A generic search service with shared, mutable parameters.
pub trait SearchFacility {
  fn params(&self) -> SearchParams;

  fn set_params(&mut self, params: SearchParams);

  /// Search with the current parameters and move the cursor to the match.
  /// Returns whether anything matched.
  fn find_next(&mut self) -> Result<bool>;
}

/// Compile `params` into a regex.
pub fn build_regex(params: &SearchParams) -> Result<Regex> {
  let mut pattern = if params.regex {
    params.pattern.clone()
  } else {
    regex_syntax::escape(&params.pattern)
  };
  if params.whole_word {
    pattern = format!(r"\b(?:{pattern})\b");
  }

  Regex::builder()
    .syntax(syntax::Config::new().case_insensitive(!params.case_sensitive))
    .build(&pattern)
    .map_err(|err| {
      SearchError::InvalidPattern {
        pattern: params.pattern.clone(),
        reason:  err.to_string(),
      }
    })
}

/// Find the next match of `params` in `buffer`, starting after `from`.
pub fn find_match<B>(buffer: &B, from: Position, params: &SearchParams) -> Result<Option<SearchMatch>>
where
  B: TextBuffer + ?Sized,
{
  if params.pattern.is_empty() {
    return Ok(None);
  }
  let regex = build_regex(params)?;
  let count = buffer.line_count();
  let cursor_line = from.line.clamp(1, count);
  let cursor = from.column;

  match params.direction {
    SearchDirection::Forward => {
      let mut lines: Vec<(usize, Bound)> = vec![(cursor_line, Bound::After(cursor))];
      lines.extend((cursor_line + 1..=count).map(|line| (line, Bound::Any)));
      if params.wrap {
        lines.extend((1..cursor_line).map(|line| (line, Bound::Any)));
        lines.push((cursor_line, Bound::UpTo(cursor)));
      }
      for (line, bound) in lines {
        let text = buffer.line(line)?;
        if let Some(found) = first_match(&regex, &text, bound) {
          return Ok(Some(found.on_line(line)));
        }
      }
    },
    SearchDirection::Backward => {
      let mut lines: Vec<(usize, Bound)> = vec![(cursor_line, Bound::Before(cursor))];
      lines.extend((1..cursor_line).rev().map(|line| (line, Bound::Any)));
      if params.wrap {
        lines.extend((cursor_line + 1..=count).rev().map(|line| (line, Bound::Any)));
        lines.push((cursor_line, Bound::After(cursor)));
      }
      for (line, bound) in lines {
        let text = buffer.line(line)?;
        if let Some(found) = last_match(&regex, &text, bound) {
          return Ok(Some(found.on_line(line)));
        }
      }
    },
  }

  Ok(None)
}

/// Which match starts (char columns) are acceptable on a line.
#[derive(Debug, Clone, Copy)]
enum Bound {
  Any,
  After(usize),
  Before(usize),
  UpTo(usize),
}

impl Bound {
  fn accepts(self, start: usize) -> bool {
    match self {
      Bound::Any => true,
      Bound::After(column) => start > column,
      Bound::Before(column) => start < column,
      Bound::UpTo(column) => start <= column,
    }
  }
}

struct LineMatch {
  start: usize,
  end:   usize,
}

impl LineMatch {
  fn on_line(self, line: usize) -> SearchMatch {
    SearchMatch {
      line,
      start: self.start,
      end: self.end,
    }
  }
}

fn char_column(text: &str, byte: usize) -> usize {
  text[..byte].chars().count()
}

fn first_match(regex: &Regex, text: &str, bound: Bound) -> Option<LineMatch> {
  let start_byte = match bound {
    Bound::After(column) => text.char_indices().nth(column + 1)?.0,
    _ => 0,
  };
  let input = Input::new(text).range(start_byte..);
  regex
    .find_iter(input)
    .map(|found| {
      LineMatch {
        start: char_column(text, found.start()),
        end:   char_column(text, found.end()),
      }
    })
    .find(|found| bound.accepts(found.start))
}

fn last_match(regex: &Regex, text: &str, bound: Bound) -> Option<LineMatch> {
  regex
    .find_iter(text)
    .map(|found| {
      LineMatch {
        start: char_column(text, found.start()),
        end:   char_column(text, found.end()),
      }
    })
    .filter(|found| bound.accepts(found.start))
    .last()
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;
  use crate::document::Document;

  fn params(pattern: &str) -> SearchParams {
    SearchParams {
      pattern: pattern.into(),
      ..Default::default()
    }
  }

  fn doc(text: &str) -> Document {
    Document::new(Rope::from(text))
  }

  #[test]
  fn forward_skips_match_at_cursor() {
    let doc = doc("foo foo\nbar foo\n");
    let found = find_match(&doc, Position::new(1, 0), &params("foo")).unwrap();
    assert_eq!(
      found,
      Some(SearchMatch {
        line:  1,
        start: 4,
        end:   7,
      })
    );
    let found = find_match(&doc, Position::new(1, 4), &params("foo")).unwrap();
    assert_eq!(found.map(|m| (m.line, m.start)), Some((2, 4)));
  }

  #[test]
  fn wrap_controls_revisiting_the_top() {
    let doc = doc("target\nother\nother\n");
    let mut search = params("target");
    search.wrap = false;
    assert_eq!(find_match(&doc, Position::new(2, 0), &search).unwrap(), None);

    search.wrap = true;
    let found = find_match(&doc, Position::new(2, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(1));
  }

  #[test]
  fn wrap_finds_the_match_under_the_cursor_last() {
    let doc = doc("only\n");
    let found = find_match(&doc, Position::new(1, 0), &params("only")).unwrap();
    assert_eq!(found.map(|m| (m.line, m.start)), Some((1, 0)));
  }

  #[test]
  fn backward_search() {
    let doc = doc("x\nx\nx\n");
    let mut search = params("x");
    search.direction = SearchDirection::Backward;
    search.wrap = false;
    let found = find_match(&doc, Position::new(2, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(1));
    assert_eq!(find_match(&doc, Position::new(1, 0), &search).unwrap(), None);

    search.wrap = true;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(3));
  }

  #[test]
  fn anchored_regex_only_matches_line_starts() {
    let doc = doc("a # note\n   # note\n");
    let mut search = params(r"^\s*#");
    search.regex = true;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(
      found,
      Some(SearchMatch {
        line:  2,
        start: 0,
        end:   4,
      })
    );
  }

  #[test]
  fn literal_patterns_are_escaped() {
    let doc = doc("a.b\naxb\n");
    let found = find_match(&doc, Position::new(1, 0), &params("a.b")).unwrap();
    assert_eq!(found.map(|m| m.line), Some(1));

    let mut search = params("a.b");
    search.regex = true;
    search.wrap = false;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(2));
  }

  #[test]
  fn case_and_word_flags() {
    let doc = doc("start\nFOO\nfoobar\nfoo\n");
    let mut search = params("foo");
    search.wrap = false;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(2));

    search.case_sensitive = true;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(3));

    search.whole_word = true;
    let found = find_match(&doc, Position::new(1, 0), &search).unwrap();
    assert_eq!(found.map(|m| m.line), Some(4));
  }

  #[test]
  fn columns_are_chars() {
    let doc = doc("ü ü x\n");
    let found = find_match(&doc, Position::new(1, 0), &params("x")).unwrap();
    assert_eq!(
      found,
      Some(SearchMatch {
        line:  1,
        start: 4,
        end:   5,
      })
    );
  }

  #[test]
  fn invalid_pattern_is_an_error() {
    let doc = doc("x\n");
    let mut search = params("(");
    search.regex = true;
    assert!(matches!(
      find_match(&doc, Position::new(1, 0), &search),
      Err(SearchError::InvalidPattern { .. })
    ));
    assert_eq!(find_match(&doc, Position::new(1, 0), &params("")).unwrap(), None);
  }
}
