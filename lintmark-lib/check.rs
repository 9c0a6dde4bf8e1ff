//! Running a check against a buffer.
//!
//! [`LintCheck`] ties the pieces together: it asks the host to save the
//! buffer, runs the analyzer, collects its findings and hands them to the
//! [`Annotator`]. The configuration is resolved once and replaced
//! explicitly through [`LintCheck::reload`].

use std::path::{
  Path,
  PathBuf,
};

use lintmark_core::path::absolutize;
use thiserror::Error;

use crate::{
  analyzer::{
    AnalyzerError,
    AnalyzerRequest,
    AnalyzerRunner,
  },
  buffer::TextBuffer,
  command::Command,
  config::{
    ConfigError,
    LintConfig,
  },
  diagnostic::DiagnosticCollector,
  engine::{
    Annotator,
    EngineError,
  },
  format::{
    AnnotationRecord,
    Part,
  },
  locate,
  search::SearchFacility,
};

#[derive(Debug, Error)]
pub enum LintError {
  #[error(transparent)]
  Engine(#[from] EngineError),
  #[error(transparent)]
  Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, LintError>;

/// Host hooks around saving the buffer before the analyzer reads the file.
pub trait SaveGate {
  fn is_saved(&self) -> bool;

  /// Ask the user whether to save now.
  fn confirm_save(&mut self) -> bool;

  fn save(&mut self);

  /// Audible or visual feedback at the end of a command.
  fn bell(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
  /// The buffer was not saved, nothing ran.
  Aborted,
  /// The analyzer could not run. A note was added at the cursor line.
  Unavailable { lines: Vec<usize> },
  Failed { reason: String },
  Annotated { lines: Vec<usize>, dropped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
  Checked(CheckOutcome),
  Removed(bool),
  Found(bool),
}

/// What a command runs against.
pub struct CommandContext<'a, B: ?Sized, G: ?Sized> {
  pub buffer:    &'a mut B,
  pub file:      &'a Path,
  pub save_gate: &'a mut G,
  /// First and last selected line.
  pub selection: (usize, usize),
}

pub struct LintCheck<R> {
  runner:    R,
  config:    LintConfig,
  annotator: Annotator,
}

impl<R: AnalyzerRunner> LintCheck<R> {
  pub fn new(runner: R, config: LintConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      runner,
      annotator: Annotator::new(config.style()),
      config,
    })
  }

  pub fn config(&self) -> &LintConfig {
    &self.config
  }

  /// Replace the configuration. The old one stays when `config` is invalid.
  pub fn reload(&mut self, config: LintConfig) -> Result<()> {
    config.validate()?;
    self.annotator = Annotator::new(config.style());
    self.config = config;
    Ok(())
  }

  /// Analyze `file` and annotate `buffer`, which holds its contents.
  pub fn check<B, G>(&mut self, buffer: &mut B, file: &Path, save_gate: &mut G) -> Result<CheckOutcome>
  where
    B: TextBuffer + ?Sized,
    G: SaveGate + ?Sized,
  {
    if !save_gate.is_saved() {
      if !save_gate.confirm_save() {
        tracing::info!(file = %file.display(), "check cancelled, buffer is not saved");
        save_gate.bell();
        return Ok(CheckOutcome::Aborted);
      }
      save_gate.save();
      if !save_gate.is_saved() {
        tracing::warn!(file = %file.display(), "check cancelled, saving failed");
        save_gate.bell();
        return Ok(CheckOutcome::Aborted);
      }
    }

    let base_dir = current_dir(file);
    let file = absolutize(file, &base_dir);
    let request = AnalyzerRequest::new(&file, &self.config);
    tracing::debug!(
      file = %file.display(),
      analyzer = self.runner.name(),
      jobs = request.jobs,
      disabled = ?request.disabled,
      "running analyzer"
    );

    let raws = match self.runner.run(&request) {
      Ok(raws) => raws,
      Err(AnalyzerError::Unavailable { analyzer, reason }) => {
        tracing::warn!(%analyzer, %reason, "analyzer unavailable");
        let note = AnnotationRecord {
          file,
          line: buffer.cursor_line(),
          column: 0,
          text: format!("Could not run {analyzer}: {reason}"),
          part: Part::Head,
        };
        let lines = self.annotator.insert_records(buffer, vec![note])?;
        save_gate.bell();
        return Ok(CheckOutcome::Unavailable { lines });
      },
      Err(err @ AnalyzerError::Failed { .. }) => {
        tracing::error!(%err, "analyzer run failed");
        save_gate.bell();
        return Ok(CheckOutcome::Failed {
          reason: err.to_string(),
        });
      },
    };

    let mut collector = DiagnosticCollector::new(base_dir);
    collector.extend(raws);
    let collected = collector.finish();

    let lines = self.annotator.annotate(
      buffer,
      &collected.records,
      &file,
      self.config.only_current_file,
    )?;
    tracing::info!(
      file = %file.display(),
      diagnostics = collected.records.len(),
      dropped = collected.dropped,
      annotated_lines = lines.len(),
      "check finished"
    );
    save_gate.bell();
    Ok(CheckOutcome::Annotated {
      lines,
      dropped: collected.dropped,
    })
  }

  pub fn remove_in_selection<B>(&self, buffer: &mut B, start_line: usize, end_line: usize) -> Result<bool>
  where
    B: TextBuffer + ?Sized,
  {
    Ok(self.annotator.remove_in_selection(buffer, start_line, end_line)?)
  }

  pub fn remove_all<B>(&self, buffer: &mut B) -> Result<bool>
  where
    B: TextBuffer + ?Sized,
  {
    Ok(self.annotator.remove_all(buffer)?)
  }

  pub fn find_next_annotation<S>(&self, search: &mut S) -> bool
  where
    S: SearchFacility + ?Sized,
  {
    locate::find_next_annotation(search, &self.config.marker, self.config.search_wrap)
  }

  pub fn handle<B, G>(&mut self, command: Command, ctx: CommandContext<'_, B, G>) -> Result<CommandOutcome>
  where
    B: TextBuffer + SearchFacility + ?Sized,
    G: SaveGate + ?Sized,
  {
    tracing::debug!(event = command.event(), "handling command");
    let outcome = match command {
      Command::Check => CommandOutcome::Checked(self.check(ctx.buffer, ctx.file, ctx.save_gate)?),
      Command::RemoveSelected => {
        let (start, end) = ctx.selection;
        CommandOutcome::Removed(self.remove_in_selection(ctx.buffer, start, end)?)
      },
      Command::RemoveAll => CommandOutcome::Removed(self.remove_all(ctx.buffer)?),
      Command::FindNext => {
        let found = self.find_next_annotation(ctx.buffer);
        if !found {
          ctx.save_gate.bell();
        }
        CommandOutcome::Found(found)
      },
    };
    Ok(outcome)
  }
}

fn current_dir(file: &Path) -> PathBuf {
  std::env::current_dir().unwrap_or_else(|_| {
    file
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default()
  })
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use super::*;
  use crate::{
    analyzer::{
      self,
      ReportRunner,
    },
    buffer::Position,
    diagnostic::RawDiagnostic,
    document::Document,
  };

  const FILE: &str = "/work/a.py";

  #[derive(Default)]
  struct Gate {
    saved:   bool,
    accept:  bool,
    save_ok: bool,
    bells:   usize,
  }

  impl Gate {
    fn saved() -> Self {
      Self {
        saved: true,
        ..Default::default()
      }
    }
  }

  impl SaveGate for Gate {
    fn is_saved(&self) -> bool {
      self.saved
    }

    fn confirm_save(&mut self) -> bool {
      self.accept
    }

    fn save(&mut self) {
      self.saved = self.save_ok;
    }

    fn bell(&mut self) {
      self.bells += 1;
    }
  }

  struct Broken(AnalyzerError);

  impl AnalyzerRunner for Broken {
    fn name(&self) -> &str {
      "broken"
    }

    fn run(&mut self, _request: &AnalyzerRequest) -> analyzer::Result<Vec<RawDiagnostic>> {
      Err(self.0.clone())
    }
  }

  fn raw(line: i64, column: i64, msg: &str) -> RawDiagnostic {
    RawDiagnostic {
      abspath: Some(FILE.into()),
      line: Some(line),
      column: Some(column),
      msg: Some(msg.into()),
      msg_id: Some("unused-variable".into()),
      symbol: Some("W0612".into()),
      ..Default::default()
    }
  }

  fn checker(report: Vec<RawDiagnostic>) -> LintCheck<ReportRunner> {
    LintCheck::new(ReportRunner::new("report", report), LintConfig::default()).unwrap()
  }

  #[test]
  fn annotates_and_counts_dropped_records() {
    let mut doc = Document::new(Rope::from("def f():\n    x = 1\n"));
    let mut checker = checker(vec![raw(2, 4, "unused variable x"), RawDiagnostic::default()]);
    let mut gate = Gate::saved();

    let outcome = checker.check(&mut doc, Path::new(FILE), &mut gate).unwrap();
    assert_eq!(outcome, CheckOutcome::Annotated {
      lines:   vec![2],
      dropped: 1,
    });
    assert_eq!(
      *doc.text(),
      "def f():\n    # lintcheck: W0612 (unused-variable): unused variable x\n    x = 1\n"
    );
    assert_eq!(gate.bells, 1);
  }

  #[test]
  fn declined_save_aborts_without_mutation() {
    let mut doc = Document::new(Rope::from("x = 1\n"));
    let mut checker = checker(vec![raw(1, 0, "m")]);
    let mut gate = Gate::default();
    assert_eq!(
      checker.check(&mut doc, Path::new(FILE), &mut gate).unwrap(),
      CheckOutcome::Aborted
    );
    assert_eq!(*doc.text(), "x = 1\n");
    assert_eq!(gate.bells, 1);

    let mut gate = Gate {
      accept: true,
      ..Default::default()
    };
    assert_eq!(
      checker.check(&mut doc, Path::new(FILE), &mut gate).unwrap(),
      CheckOutcome::Aborted
    );

    let mut gate = Gate {
      accept: true,
      save_ok: true,
      ..Default::default()
    };
    assert!(matches!(
      checker.check(&mut doc, Path::new(FILE), &mut gate).unwrap(),
      CheckOutcome::Annotated { .. }
    ));
  }

  #[test]
  fn unavailable_analyzer_leaves_a_note_at_the_cursor() {
    let mut doc = Document::new(Rope::from("a\nb\n"));
    doc.set_cursor(Position::new(2, 0));
    let mut checker = LintCheck::new(
      Broken(AnalyzerError::Unavailable {
        analyzer: "pylint".into(),
        reason:   "not installed".into(),
      }),
      LintConfig::default(),
    )
    .unwrap();

    let outcome = checker.check(&mut doc, Path::new(FILE), &mut Gate::saved()).unwrap();
    assert_eq!(outcome, CheckOutcome::Unavailable { lines: vec![2] });
    assert_eq!(*doc.text(), "a\n# lintcheck: Could not run pylint: not installed\nb\n");
  }

  #[test]
  fn failed_analyzer_changes_nothing() {
    let mut doc = Document::new(Rope::from("a\n"));
    let mut checker = LintCheck::new(
      Broken(AnalyzerError::Failed {
        analyzer: "pylint".into(),
        reason:   "exit status 32".into(),
      }),
      LintConfig::default(),
    )
    .unwrap();
    let outcome = checker.check(&mut doc, Path::new(FILE), &mut Gate::saved()).unwrap();
    assert!(matches!(outcome, CheckOutcome::Failed { .. }));
    assert_eq!(*doc.text(), "a\n");
    assert!(doc.history().is_empty());
  }

  #[test]
  fn reload_switches_marker() {
    let mut checker = checker(vec![raw(1, 0, "m")]);
    checker
      .reload(LintConfig {
        marker: "#! ".into(),
        ..Default::default()
      })
      .unwrap();
    assert!(
      checker
        .reload(LintConfig {
          marker: String::new(),
          ..Default::default()
        })
        .is_err()
    );
    assert_eq!(checker.config().marker, "#! ");

    let mut doc = Document::new(Rope::from("x\n"));
    checker.check(&mut doc, Path::new(FILE), &mut Gate::saved()).unwrap();
    assert_eq!(*doc.text(), "#! W0612 (unused-variable): m\nx\n");
  }

  #[test]
  fn commands_dispatch_through_the_event_table() {
    let mut checker = checker(vec![raw(1, 0, "one"), raw(3, 0, "three")]);
    let mut doc = Document::new(Rope::from("a\nb\nc\n"));
    let mut gate = Gate::saved();
    let file = Path::new(FILE);

    let run = |checker: &mut LintCheck<ReportRunner>, doc: &mut Document, gate: &mut Gate, event, selection| {
      let command = Command::from_event(event).unwrap();
      checker
        .handle(command, CommandContext {
          buffer: doc,
          file,
          save_gate: gate,
          selection,
        })
        .unwrap()
    };

    assert!(matches!(
      run(&mut checker, &mut doc, &mut gate, "lint-check", (1, 1)),
      CommandOutcome::Checked(CheckOutcome::Annotated { .. })
    ));
    assert_eq!(doc.line_count(), 5);

    assert_eq!(
      run(&mut checker, &mut doc, &mut gate, "find-next-lint-comment", (1, 1)),
      CommandOutcome::Found(true)
    );
    assert_eq!(doc.cursor(), Position::new(4, 0));

    assert_eq!(
      run(&mut checker, &mut doc, &mut gate, "remove-lint-comments", (1, 2)),
      CommandOutcome::Removed(true)
    );
    assert_eq!(*doc.text(), "a\nb\n# lintcheck: W0612 (unused-variable): three\nc\n");

    assert_eq!(
      run(&mut checker, &mut doc, &mut gate, "remove-all-lint-comments", (1, 1)),
      CommandOutcome::Removed(true)
    );
    assert_eq!(*doc.text(), "a\nb\nc\n");
  }
}
