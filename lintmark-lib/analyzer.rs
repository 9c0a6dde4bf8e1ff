//! Seam to the external static analyzer.

use std::path::{
  Path,
  PathBuf,
};

use thiserror::Error;

use crate::{
  config::LintConfig,
  diagnostic::RawDiagnostic,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
  /// The analyzer cannot be run at all, e.g. it is not installed.
  #[error("{analyzer} is unavailable: {reason}")]
  Unavailable { analyzer: String, reason: String },
  #[error("{analyzer} failed: {reason}")]
  Failed { analyzer: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// One analyzer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerRequest {
  pub file:     PathBuf,
  /// Worker count, 0 lets the analyzer decide.
  pub jobs:     usize,
  /// Rule ids to disable.
  pub disabled: Vec<String>,
}

impl AnalyzerRequest {
  pub fn new(file: impl Into<PathBuf>, config: &LintConfig) -> Self {
    Self {
      file:     file.into(),
      jobs:     config.jobs,
      disabled: config.ignore.clone(),
    }
  }

  pub fn file(&self) -> &Path {
    &self.file
  }
}

/// Runs the analyzer and hands back its raw findings. Calls block until the
/// analyzer is done.
pub trait AnalyzerRunner {
  /// Name shown in messages about this analyzer.
  fn name(&self) -> &str;

  fn run(&mut self, request: &AnalyzerRequest) -> Result<Vec<RawDiagnostic>>;
}

impl<R: AnalyzerRunner + ?Sized> AnalyzerRunner for Box<R> {
  fn name(&self) -> &str {
    (**self).name()
  }

  fn run(&mut self, request: &AnalyzerRequest) -> Result<Vec<RawDiagnostic>> {
    (**self).run(request)
  }
}

/// Replays a fixed report, e.g. one saved from an earlier analyzer run.
#[derive(Debug, Clone, Default)]
pub struct ReportRunner {
  name:   String,
  report: Vec<RawDiagnostic>,
}

impl ReportRunner {
  pub fn new(name: impl Into<String>, report: Vec<RawDiagnostic>) -> Self {
    Self {
      name: name.into(),
      report,
    }
  }
}

impl AnalyzerRunner for ReportRunner {
  fn name(&self) -> &str {
    &self.name
  }

  fn run(&mut self, request: &AnalyzerRequest) -> Result<Vec<RawDiagnostic>> {
    tracing::debug!(file = %request.file.display(), records = self.report.len(), "replaying report");
    Ok(self.report.clone())
  }
}
