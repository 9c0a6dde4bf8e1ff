//! Command line host for lintmark.
//!
//! Loads a file into a [`Document`], runs the checker against it and writes
//! the result back:
//! - `check` annotates the file with analyzer diagnostics
//! - `remove` deletes annotation lines again
//! - `next` prints where the next annotation is

mod config;
mod logging;
mod pylint;

use std::{
  fs::File,
  io::{
    BufWriter,
    Read,
    Write,
  },
  path::{
    Path,
    PathBuf,
  },
  process::ExitCode,
};

use clap::{
  Parser,
  Subcommand,
};
use eyre::{
  Result,
  WrapErr,
  bail,
};
use lintmark_core::path::absolutize;
use lintmark_lib::{
  analyzer::{
    AnalyzerRequest,
    AnalyzerRunner,
    ReportRunner,
  },
  buffer::Position,
  check::{
    CheckOutcome,
    LintCheck,
    SaveGate,
  },
  config::LintConfig,
  diagnostic::{
    DiagnosticCollector,
    parse_report,
  },
  document::Document,
  engine::Annotator,
  locate::find_next_annotation,
};
use ropey::Rope;

use crate::pylint::PylintRunner;

#[derive(Debug, Parser)]
#[command(name = "lintmark")]
#[command(about = "Annotate source files with static analysis diagnostics")]
struct Cli {
  /// Increase logging, repeat for more
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Config file applied on top of the user and workspace config
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
  /// Run the analyzer and insert annotations above the reported lines
  Check {
    file: PathBuf,

    /// Read a saved JSON report instead of running the analyzer, `-` for stdin
    #[arg(long)]
    report: Option<String>,

    /// Annotate every reported file instead of pointing at them
    #[arg(long)]
    all_files: bool,

    /// Print the result instead of writing the file
    #[arg(long)]
    dry_run: bool,
  },
  /// Delete annotation lines
  Remove {
    file: PathBuf,

    /// Only delete inside START:END (1-based, inclusive)
    #[arg(long, value_parser = parse_line_range)]
    lines: Option<(usize, usize)>,

    #[arg(long)]
    dry_run: bool,
  },
  /// Print `line:column` of the next annotation after a position
  Next {
    file: PathBuf,

    #[arg(long, default_value_t = 1)]
    line: usize,

    /// 0-based char column
    #[arg(long, default_value_t = 0)]
    column: usize,

    /// Continue from the top of the file
    #[arg(long, conflicts_with = "no_wrap")]
    wrap: bool,

    #[arg(long)]
    no_wrap: bool,
  },
}

/// The file is read straight from disk, so it is always saved.
struct OnDisk;

impl SaveGate for OnDisk {
  fn is_saved(&self) -> bool {
    true
  }

  fn confirm_save(&mut self) -> bool {
    true
  }

  fn save(&mut self) {}
}

fn parse_line_range(value: &str) -> std::result::Result<(usize, usize), String> {
  let parse = |part: &str, default: usize| -> std::result::Result<usize, String> {
    let part = part.trim();
    if part.is_empty() {
      return Ok(default);
    }
    part
      .parse()
      .map_err(|err| format!("invalid line number `{part}`: {err}"))
  };
  match value.split_once(':') {
    Some((start, end)) => Ok((parse(start, 1)?, parse(end, usize::MAX)?)),
    None => {
      let line = parse(value, 1)?;
      Ok((line, line))
    },
  }
}

fn load_document(path: &Path) -> Result<Document> {
  let file = File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
  let text = Rope::from_reader(file).wrap_err_with(|| format!("failed to read {}", path.display()))?;
  Ok(Document::new(text).with_path(path))
}

fn write_document(doc: &Document, dry_run: bool) -> Result<()> {
  if dry_run {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    doc.text().write_to(&mut out)?;
    out.flush()?;
    return Ok(());
  }
  if !doc.flags().modified {
    tracing::info!("nothing changed");
    return Ok(());
  }
  let Some(path) = doc.path() else {
    bail!("document has no path to write to");
  };
  let file = File::create(path).wrap_err_with(|| format!("failed to write {}", path.display()))?;
  let mut out = BufWriter::new(file);
  doc.text().write_to(&mut out)?;
  out.flush()?;
  Ok(())
}

fn runner(config: &LintConfig, report: Option<&str>) -> Result<Box<dyn AnalyzerRunner>> {
  let Some(report) = report else {
    return Ok(Box::new(PylintRunner::new(config.analyzer.clone())));
  };
  let json = if report == "-" {
    let mut json = String::new();
    std::io::stdin().read_to_string(&mut json)?;
    json
  } else {
    std::fs::read_to_string(report).wrap_err_with(|| format!("failed to read report {report}"))?
  };
  let raws = parse_report(&json).wrap_err("failed to parse analyzer report")?;
  Ok(Box::new(ReportRunner::new(report, raws)))
}

fn check(config: LintConfig, file: &Path, report: Option<&str>, dry_run: bool) -> Result<()> {
  let mut doc = load_document(file)?;
  let mut checker = LintCheck::new(runner(&config, report)?, config)?;
  match checker.check(&mut doc, file, &mut OnDisk)? {
    CheckOutcome::Annotated { lines, dropped } => {
      if dropped > 0 {
        tracing::warn!(dropped, "skipped malformed diagnostics");
      }
      tracing::info!(?lines, "annotated");
    },
    CheckOutcome::Unavailable { .. } => {
      tracing::warn!("analyzer unavailable, left a note in the file");
    },
    CheckOutcome::Failed { reason } => bail!(reason),
    CheckOutcome::Aborted => bail!("check aborted"),
  }
  write_document(&doc, dry_run)
}

/// Annotate every file the analyzer reports on, each in its own document.
fn check_all_files(config: LintConfig, file: &Path, report: Option<&str>, dry_run: bool) -> Result<()> {
  let base_dir = std::env::current_dir()?;
  let mut runner = runner(&config, report)?;
  let request = AnalyzerRequest::new(absolutize(file, &base_dir), &config);
  let raws = runner.run(&request)?;

  let mut collector = DiagnosticCollector::new(&base_dir);
  collector.extend(raws);
  let collected = collector.finish();
  if collected.dropped > 0 {
    tracing::warn!(dropped = collected.dropped, "skipped malformed diagnostics");
  }

  let mut files: Vec<&Path> = collected
    .records
    .iter()
    .map(|record| record.file_path.as_path())
    .collect();
  files.sort();
  files.dedup();

  let annotator = Annotator::new(config.style());
  for path in files {
    let mut doc = load_document(path)?;
    let lines = annotator.annotate(&mut doc, &collected.records, path, false)?;
    tracing::info!(file = %path.display(), ?lines, "annotated");
    write_document(&doc, dry_run)?;
  }
  Ok(())
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  logging::setup_logging(cli.verbose)?;

  let cwd = std::env::current_dir()?;
  let user_config = config::user_config_file();
  let config = config::load_config(user_config.as_deref(), &cwd, cli.config.as_deref())?;

  match cli.command {
    Cmd::Check {
      file,
      report,
      all_files,
      dry_run,
    } => {
      if all_files {
        check_all_files(config, &file, report.as_deref(), dry_run)?;
      } else {
        check(config, &file, report.as_deref(), dry_run)?;
      }
    },
    Cmd::Remove {
      file,
      lines,
      dry_run,
    } => {
      let mut doc = load_document(&file)?;
      let annotator = Annotator::new(config.style());
      let removed = match lines {
        Some((start, end)) => annotator.remove_in_selection(&mut doc, start, end)?,
        None => annotator.remove_all(&mut doc)?,
      };
      tracing::info!(removed, "removed annotations");
      write_document(&doc, dry_run)?;
    },
    Cmd::Next {
      file,
      line,
      column,
      wrap,
      no_wrap,
    } => {
      let mut doc = load_document(&file)?;
      doc.set_cursor(Position::new(line, column));
      let wrap = if wrap {
        true
      } else if no_wrap {
        false
      } else {
        config.search_wrap
      };
      if !find_next_annotation(&mut doc, &config.marker, wrap) {
        return Ok(ExitCode::FAILURE);
      }
      let cursor = doc.cursor();
      println!("{}:{}", cursor.line, cursor.column);
    },
  }

  Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
  use lintmark_lib::buffer::TextBuffer;

  use super::*;

  #[test]
  fn line_ranges() {
    assert_eq!(parse_line_range("3:7"), Ok((3, 7)));
    assert_eq!(parse_line_range("4"), Ok((4, 4)));
    assert_eq!(parse_line_range(":5"), Ok((1, 5)));
    assert_eq!(parse_line_range("2:"), Ok((2, usize::MAX)));
    assert!(parse_line_range("a:b").is_err());
  }

  #[test]
  fn document_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.py");
    std::fs::write(&path, "def f():\n    x = 1\n").unwrap();

    let mut doc = load_document(&path).unwrap();
    assert_eq!(doc.line_count(), 2);
    write_document(&doc, false).unwrap();

    let report = dir.path().join("report.json");
    std::fs::write(
      &report,
      format!(
        r#"[{{"path": "{}", "line": 2, "column": 4, "symbol": "unused-variable", "message-id": "W0612", "message": "Unused variable 'x'"}}]"#,
        path.display()
      ),
    )
    .unwrap();
    check(
      LintConfig::default(),
      &path,
      Some(report.to_str().unwrap()),
      false,
    )
    .unwrap();
    assert_eq!(
      std::fs::read_to_string(&path).unwrap(),
      "def f():\n    # lintcheck: unused-variable (W0612): Unused variable 'x'\n    x = 1\n"
    );

    doc = load_document(&path).unwrap();
    Annotator::default().remove_all(&mut doc).unwrap();
    write_document(&doc, false).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "def f():\n    x = 1\n");
  }
}
