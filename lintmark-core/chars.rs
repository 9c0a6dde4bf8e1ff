use crate::line_ending::LineEnding;

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  ch == '\u{000D}' || LineEnding::from_char(ch).is_some()
}

/// Length, in chars, of the run of `indent` at the start of `line`.
///
/// A line made up only of `indent` counts every char.
pub fn leading_run(line: &str, indent: char) -> usize {
  line.chars().take_while(|&ch| ch == indent).count()
}

/// `line` without its leading whitespace.
pub fn trim_indent(line: &str) -> &str {
  line.trim_start()
}
