//! Lexical path helpers used to compare analyzer paths with buffer paths.

use std::path::{
  Component,
  Path,
  PathBuf,
};

/// Normalize a path lexically: drop `.` components and fold `..` into its
/// parent. Symlinks are not resolved and the filesystem is never touched.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        let popped = matches!(
          normalized.components().next_back(),
          Some(Component::Normal(_))
        ) && normalized.pop();
        if !popped && !normalized.has_root() {
          normalized.push("..");
        }
      },
      other => normalized.push(other),
    }
  }
  normalized
}

/// Join a relative `path` onto `base` and normalize the result. Absolute paths
/// are only normalized.
pub fn absolutize(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
  let path = path.as_ref();
  if path.is_absolute() {
    normalize(path)
  } else {
    normalize(base.as_ref().join(path))
  }
}
