//! Checker commands and the event names hosts bind them to.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
  /// Run the analyzer and annotate the buffer.
  Check,
  /// Remove the annotations inside the selection.
  RemoveSelected,
  RemoveAll,
  /// Move to the next annotation.
  FindNext,
}

/// Event names, in the order hosts list them in menus.
pub static EVENTS: &[(&str, Command)] = &[
  ("lint-check", Command::Check),
  ("remove-lint-comments", Command::RemoveSelected),
  ("remove-all-lint-comments", Command::RemoveAll),
  ("find-next-lint-comment", Command::FindNext),
];

impl Command {
  pub fn from_event(name: &str) -> Option<Self> {
    EVENTS
      .iter()
      .find(|(event, _)| *event == name)
      .map(|(_, command)| *command)
  }

  pub fn event(self) -> &'static str {
    EVENTS
      .iter()
      .find(|(_, command)| *command == self)
      .map(|(event, _)| *event)
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn event_names_round_trip() {
    for (event, command) in EVENTS {
      assert_eq!(Command::from_event(event), Some(*command));
      assert_eq!(command.event(), *event);
    }
    assert_eq!(Command::from_event("lint_check"), None);
  }
}
