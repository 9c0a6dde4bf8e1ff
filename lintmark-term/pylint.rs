//! Running pylint as a child process.

use std::{
  ffi::OsString,
  path::PathBuf,
  process::{
    Command,
    ExitStatus,
  },
};

use lintmark_lib::{
  analyzer::{
    AnalyzerError,
    AnalyzerRequest,
    AnalyzerRunner,
    Result,
  },
  diagnostic::{
    RawDiagnostic,
    parse_report,
  },
};

/// Pylint sets this exit status bit for command line usage errors.
const USAGE_ERROR: i32 = 32;

#[derive(Debug, Clone)]
pub struct PylintRunner {
  program: String,
}

impl PylintRunner {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn locate(&self) -> Result<PathBuf> {
    which::which(&self.program).map_err(|err| {
      AnalyzerError::Unavailable {
        analyzer: self.program.clone(),
        reason:   err.to_string(),
      }
    })
  }

  fn failed(&self, reason: impl Into<String>) -> AnalyzerError {
    AnalyzerError::Failed {
      analyzer: self.program.clone(),
      reason:   reason.into(),
    }
  }

  fn check_status(&self, status: ExitStatus, stderr: &[u8]) -> Result<()> {
    match status.code() {
      Some(code) if code & USAGE_ERROR == 0 => Ok(()),
      _ => {
        let stderr = String::from_utf8_lossy(stderr);
        Err(self.failed(format!("{status}: {}", stderr.trim())))
      },
    }
  }
}

/// Arguments for one pylint run, file first.
pub fn arguments(request: &AnalyzerRequest) -> Vec<OsString> {
  let mut args = vec![
    request.file.clone().into_os_string(),
    format!("--jobs={}", request.jobs).into(),
    "--output-format=json".into(),
  ];
  if !request.disabled.is_empty() {
    args.push(format!("--disable={}", request.disabled.join(",")).into());
  }
  args
}

impl AnalyzerRunner for PylintRunner {
  fn name(&self) -> &str {
    &self.program
  }

  fn run(&mut self, request: &AnalyzerRequest) -> Result<Vec<RawDiagnostic>> {
    let program = self.locate()?;
    let args = arguments(request);
    tracing::debug!(program = %program.display(), ?args, "spawning analyzer");

    let output = Command::new(&program).args(&args).output().map_err(|err| {
      AnalyzerError::Unavailable {
        analyzer: self.program.clone(),
        reason:   err.to_string(),
      }
    })?;
    self.check_status(output.status, &output.stderr)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
      return Ok(Vec::new());
    }
    parse_report(&stdout).map_err(|err| self.failed(err.to_string()))
  }
}
