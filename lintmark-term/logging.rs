use eyre::{
  Result,
  WrapErr,
};
use log::LevelFilter;

pub const LOG_ENV: &str = "LINTMARK_LOG";

/// Log level for `-v` repeated `verbosity` times; `env` wins when it names a
/// level.
pub fn level(verbosity: u8, env: Option<&str>) -> LevelFilter {
  if let Some(level) = env.and_then(|env| env.trim().parse().ok()) {
    return level;
  }
  match verbosity {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

/// Send log records, including `tracing` events, to stderr.
pub fn setup_logging(verbosity: u8) -> Result<()> {
  let env = std::env::var(LOG_ENV).ok();
  let level = level(verbosity, env.as_deref());

  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} [{}] {}",
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level)
    .chain(std::io::stderr())
    .apply()
    .wrap_err("failed to install logger")
}
