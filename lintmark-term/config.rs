//! Locating and merging config files.
//!
//! Later sources win: the user config in the platform config directory, then
//! `.lintmark.toml` at the workspace root, then the file given on the command
//! line.

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use eyre::{
  Result,
  WrapErr,
};
use lintmark_lib::config::LintConfig;

pub const WORKSPACE_CONFIG: &str = ".lintmark.toml";

pub fn config_dir() -> Option<PathBuf> {
  if let Ok(dir) = std::env::var("LINTMARK_CONFIG_DIR") {
    return Some(expand_tilde(Path::new(&dir)).into_owned());
  }
  let strategy = choose_base_strategy().ok()?;
  let mut path = strategy.config_dir();
  path.push("lintmark");
  Some(path)
}

pub fn user_config_file() -> Option<PathBuf> {
  config_dir().map(|dir| dir.join("config.toml"))
}

fn expand_tilde(path: &Path) -> Cow<'_, Path> {
  match path.strip_prefix("~") {
    Ok(rest) => {
      match etcetera::home_dir() {
        Ok(home) => Cow::Owned(home.join(rest)),
        Err(_) => Cow::Borrowed(path),
      }
    },
    Err(_) => Cow::Borrowed(path),
  }
}

/// Walk up from `dir` to the first directory that looks like a project root.
/// Returns `dir` itself when there is none.
pub fn find_workspace_in(dir: impl AsRef<Path>) -> PathBuf {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if ancestor.join(".git").exists()
      || ancestor.join(".jj").exists()
      || ancestor.join(WORKSPACE_CONFIG).exists()
    {
      return ancestor.to_owned();
    }
  }
  dir.to_owned()
}

/// Merge `right` onto `left`. Tables are merged key by key up to
/// `merge_depth` levels, every other value is replaced.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (name, rvalue) in right_map {
        let merged = match left_map.remove(&name) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(name, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

fn read_toml(path: &Path) -> Result<Option<toml::Value>> {
  let source = match std::fs::read_to_string(path) {
    Ok(source) => source,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
    Err(err) => {
      return Err(err).wrap_err_with(|| format!("failed to read {}", path.display()));
    },
  };
  let value: toml::Value = toml::from_str(&source).wrap_err_with(|| format!("failed to parse {}", path.display()))?;
  tracing::debug!(path = %path.display(), "loaded config file");
  Ok(Some(value))
}

/// Resolve the effective config for files under `workspace`, starting from
/// the `user` config file.
pub fn load_config(user: Option<&Path>, workspace: &Path, explicit: Option<&Path>) -> Result<LintConfig> {
  let mut files: Vec<PathBuf> = user.map(Path::to_path_buf).into_iter().collect();
  files.push(find_workspace_in(workspace).join(WORKSPACE_CONFIG));

  let mut merged = toml::Value::Table(toml::Table::new());
  for file in &files {
    if let Some(value) = read_toml(file)? {
      merged = merge_toml_values(merged, value, 3);
    }
  }
  if let Some(explicit) = explicit {
    let value = read_toml(explicit)?
      .ok_or_else(|| eyre::eyre!("config file not found: {}", explicit.display()))?;
    merged = merge_toml_values(merged, value, 3);
  }

  LintConfig::from_value(merged).wrap_err("invalid lintmark configuration")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn value(source: &str) -> toml::Value {
    toml::from_str(source).unwrap()
  }

  #[test]
  fn right_side_wins() {
    let merged = merge_toml_values(
      value("marker = \"# a: \"\njobs = 2\n"),
      value("jobs = 4\nsearch-wrap = false\n"),
      3,
    );
    assert_eq!(merged, value("marker = \"# a: \"\njobs = 4\nsearch-wrap = false\n"));
  }

  #[test]
  fn lists_are_replaced() {
    let merged = merge_toml_values(value("ignore = [\"C0303\"]"), value("ignore = [\"W0612\"]"), 3);
    assert_eq!(merged, value("ignore = [\"W0612\"]"));
  }

  #[test]
  fn workspace_and_explicit_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir(root.join(".git")).unwrap();
    std::fs::create_dir_all(root.join("pkg/sub")).unwrap();
    std::fs::write(root.join(WORKSPACE_CONFIG), "jobs = 2\nmarker = \"#! \"\n").unwrap();
    let explicit = root.join("override.toml");
    std::fs::write(&explicit, "jobs = -1\n").unwrap();

    assert_eq!(find_workspace_in(root.join("pkg/sub")), root);

    let config = load_config(None, &root.join("pkg/sub"), None).unwrap();
    assert_eq!(config.marker, "#! ");
    assert_eq!(config.jobs, 2);

    let config = load_config(None, &root.join("pkg"), Some(&explicit)).unwrap();
    assert_eq!(config.marker, "#! ");
    assert_eq!(config.jobs, 0);

    assert!(load_config(None, root, Some(&root.join("missing.toml"))).is_err());
  }

  #[test]
  fn user_file_is_overridden_by_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let user = dir.path().join("user.toml");
    std::fs::write(&user, "jobs = 8\nanalyzer = \"pylint3\"\n").unwrap();
    std::fs::write(dir.path().join(WORKSPACE_CONFIG), "jobs = 1\n").unwrap();

    let config = load_config(Some(&user), dir.path(), None).unwrap();
    assert_eq!(config.jobs, 1);
    assert_eq!(config.analyzer, "pylint3");
  }

  #[test]
  fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(WORKSPACE_CONFIG), "marker = \"\"\n").unwrap();
    assert!(load_config(None, dir.path(), None).is_err());
  }
}
