//! Pointers from the target file to the other files of a batch.

use std::path::Path;

use crate::{
  format::{
    AnnotationRecord,
    Part,
  },
  group::FileGroups,
};

pub fn pointer_text(file: &Path) -> String {
  format!("Another file has errors: {}", file.display())
}

/// Append one pointer record to `target`'s records for every other file in
/// `groups`, in path order.
///
/// Pointers are anchored at the smallest line already reported for the
/// target, or at `cursor_line` when there is none. The target entry is
/// created when missing. Returns how many pointers were added.
pub fn add_foreign_file_pointers(groups: &mut FileGroups, target: &Path, cursor_line: usize) -> usize {
  let pointers: Vec<String> = groups
    .keys()
    .filter(|file| file.as_path() != target)
    .map(|file| pointer_text(file))
    .collect();

  let records = groups.entry(target.to_path_buf()).or_default();
  let anchor = records
    .iter()
    .map(|record| record.line)
    .min()
    .unwrap_or(cursor_line);

  let added = pointers.len();
  records.extend(pointers.into_iter().map(|text| {
    AnnotationRecord {
      file: target.to_path_buf(),
      line: anchor,
      column: 0,
      text,
      part: Part::Head,
    }
  }));
  if added > 0 {
    tracing::debug!(target = %target.display(), added, anchor, "added foreign file pointers");
  }
  added
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use crate::{
    diagnostic::DiagnosticRecord,
    group::group_by_file,
  };

  #[test]
  fn one_pointer_per_foreign_file() {
    let mut groups = group_by_file(&[
      DiagnosticRecord::new("/fileA", 7, 0, "a"),
      DiagnosticRecord::new("/fileA", 3, 0, "b"),
      DiagnosticRecord::new("/fileB", 1, 0, "c"),
      DiagnosticRecord::new("/fileB", 2, 0, "d"),
      DiagnosticRecord::new("/fileC", 9, 0, "e"),
    ]);
    let target = Path::new("/fileA");
    assert_eq!(add_foreign_file_pointers(&mut groups, target, 1), 2);

    let pointers: Vec<_> = groups[target]
      .iter()
      .filter(|record| record.text.starts_with("Another file"))
      .collect();
    assert_eq!(pointers.len(), 2);
    assert_eq!(pointers[0].text, "Another file has errors: /fileB");
    assert_eq!(pointers[1].text, "Another file has errors: /fileC");
    assert!(pointers.iter().all(|record| record.line == 3 && record.column == 0));
  }

  #[test]
  fn missing_target_anchors_at_cursor() {
    let mut groups = group_by_file(&[DiagnosticRecord::new("/fileB", 4, 2, "x")]);
    assert_eq!(add_foreign_file_pointers(&mut groups, Path::new("/fileA"), 6), 1);
    let records = &groups[&PathBuf::from("/fileA")];
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].line, 6);
    assert_eq!(records[0].part, Part::Head);
  }

  #[test]
  fn no_foreign_files_adds_nothing() {
    let mut groups = group_by_file(&[DiagnosticRecord::new("/fileA", 4, 2, "x")]);
    assert_eq!(add_foreign_file_pointers(&mut groups, Path::new("/fileA"), 1), 0);
    assert_eq!(groups[Path::new("/fileA")].len(), 1);
  }
}
