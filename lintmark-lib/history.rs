use ropey::Rope;
use thiserror::Error;

use crate::buffer::Position;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
  #[error("revision index {index} is out of bounds (max: {max})")]
  RevisionOutOfBounds { index: usize, max: usize },
}

/// Snapshot of a document. Cloning a [`Rope`] shares its nodes, so keeping a
/// snapshot per revision stays cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub doc:    Rope,
  pub cursor: Position,
}

/// A pending jump in history that has not yet been applied.
///
/// The caller restores `state` and then calls [`History::apply_jump`], so the
/// history only moves once the document has.
#[derive(Debug, Clone)]
pub struct HistoryJump {
  pub state:  State,
  pub target: usize,
}

/// Revision history of a buffer, one revision per committed batch.
///
/// Revisions are a linear list. `current` counts the revisions applied to the
/// document, so `0` is the state it was loaded in. Committing after an undo
/// drops the revisions that could have been redone.
#[derive(Debug)]
pub struct History {
  revisions: Vec<Revision>,
  current:   usize,
}

#[derive(Debug, Clone)]
struct Revision {
  before: State,
  after:  State,
}

impl History {
  pub fn new() -> Self {
    Self {
      revisions: Vec::new(),
      current:   0,
    }
  }

  pub fn commit_revision(&mut self, before: State, after: State) {
    self.revisions.truncate(self.current);
    self.revisions.push(Revision { before, after });
    self.current = self.revisions.len();
  }

  #[inline]
  pub const fn at_root(&self) -> bool {
    self.current == 0
  }

  /// Returns the number of revisions, root included.
  #[inline]
  pub fn len(&self) -> usize {
    self.revisions.len() + 1
  }

  /// Returns whether nothing was ever committed.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.revisions.is_empty()
  }

  /// Prepare an undo. Returns `None` at the root.
  pub fn undo(&self) -> Option<HistoryJump> {
    let target = self.current.checked_sub(1)?;
    Some(HistoryJump {
      state: self.revisions[target].before.clone(),
      target,
    })
  }

  /// Prepare a redo. Returns `None` when nothing was undone.
  pub fn redo(&self) -> Option<HistoryJump> {
    let revision = self.revisions.get(self.current)?;
    Some(HistoryJump {
      state:  revision.after.clone(),
      target: self.current + 1,
    })
  }

  /// Move to the jump target. Call only after the jump's state was restored.
  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    if jump.target > self.revisions.len() {
      return Err(HistoryError::RevisionOutOfBounds {
        index: jump.target,
        max:   self.revisions.len(),
      });
    }
    self.current = jump.target;
    Ok(())
  }
}

impl Default for History {
  fn default() -> Self {
    Self::new()
  }
}
