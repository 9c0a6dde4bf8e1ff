//! Checker configuration.
//!
//! Every key is optional. A config file looks like:
//!
//! ```toml
//! ignore            = ["C0303", "W0612"]
//! jobs              = 0
//! search-wrap       = false
//! only-current-file = true
//! marker            = "# lintcheck: "
//! indent-char       = " "
//! analyzer          = "pylint"
//! ```
//!
//! `ignore` also accepts the older `;`-separated form, `"C0303;W0612"`, where
//! `"None"` stands for an empty list.

use lintmark_core::chars::char_is_line_ending;
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
};
use thiserror::Error;

use crate::format::{
  AnnotationStyle,
  DEFAULT_INDENT_CHAR,
  DEFAULT_MARKER,
};

pub const DEFAULT_ANALYZER: &str = "pylint";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Parse(#[from] toml::de::Error),
  #[error("marker must not be empty")]
  EmptyMarker,
  #[error("marker must fit on one line")]
  MultiLineMarker,
  #[error("indent char must not be a line ending")]
  InvalidIndentChar,
  #[error("analyzer program must not be empty")]
  EmptyAnalyzer,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LintConfig {
  /// Analyzer rule ids to disable.
  #[serde(deserialize_with = "deserialize_ignore")]
  pub ignore:            Vec<String>,
  /// Analyzer worker count, 0 lets the analyzer decide.
  #[serde(deserialize_with = "deserialize_jobs")]
  pub jobs:              usize,
  pub search_wrap:       bool,
  /// Annotate only the checked file, with one pointer per other file.
  pub only_current_file: bool,
  pub marker:            String,
  pub indent_char:       char,
  /// Program run to produce diagnostics.
  pub analyzer:          String,
}

impl Default for LintConfig {
  fn default() -> Self {
    Self {
      ignore:            vec!["C0303".to_string()],
      jobs:              0,
      search_wrap:       false,
      only_current_file: true,
      marker:            DEFAULT_MARKER.to_string(),
      indent_char:       DEFAULT_INDENT_CHAR,
      analyzer:          DEFAULT_ANALYZER.to_string(),
    }
  }
}

impl LintConfig {
  pub fn from_toml(source: &str) -> Result<Self> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_value(value: toml::Value) -> Result<Self> {
    let config: Self = value.try_into()?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.marker.is_empty() {
      return Err(ConfigError::EmptyMarker);
    }
    if self.marker.contains(char_is_line_ending) {
      return Err(ConfigError::MultiLineMarker);
    }
    if char_is_line_ending(self.indent_char) {
      return Err(ConfigError::InvalidIndentChar);
    }
    if self.analyzer.trim().is_empty() {
      return Err(ConfigError::EmptyAnalyzer);
    }
    Ok(())
  }

  pub fn style(&self) -> AnnotationStyle {
    AnnotationStyle::new(self.marker.clone(), self.indent_char)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IgnoreList {
  List(Vec<String>),
  Joined(String),
}

fn deserialize_ignore<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let ids: Vec<String> = match IgnoreList::deserialize(deserializer)? {
    IgnoreList::List(ids) => ids,
    IgnoreList::Joined(joined) if joined.trim() == "None" => Vec::new(),
    IgnoreList::Joined(joined) => joined.split(';').map(str::to_string).collect(),
  };
  Ok(
    ids
      .into_iter()
      .map(|id| id.trim().to_string())
      .filter(|id| !id.is_empty())
      .collect(),
  )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Jobs {
  Count(i64),
  Text(String),
}

fn deserialize_jobs<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
  D: Deserializer<'de>,
{
  let jobs = match Jobs::deserialize(deserializer)? {
    Jobs::Count(jobs) => jobs,
    Jobs::Text(text) => text.trim().parse().unwrap_or(0),
  };
  Ok(usize::try_from(jobs).unwrap_or(0))
}
