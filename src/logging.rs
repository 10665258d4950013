use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
  /// Daily-rolled file; the terminal belongs to the UI
  File,
  /// Standard error, for one-shot commands
  Stderr,
}

fn env_filter(level: &str) -> Result<EnvFilter> {
  let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
    Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
    _ => EnvFilter::try_new(level),
  };
  filter.map_err(|e| eyre!("Invalid log filter: {}", e))
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered lines reach the file.
pub fn init(config: &Config, target: LogTarget) -> Result<Option<WorkerGuard>> {
  let filter = env_filter(&config.log.level)?;

  match target {
    LogTarget::File => {
      let directory = config.log_directory();
      std::fs::create_dir_all(&directory)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", directory.display(), e))?;

      let appender = tracing_appender::rolling::daily(&directory, "ug9x.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);

      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

      Ok(Some(guard))
    }
    LogTarget::Stderr => {
      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

      Ok(None)
    }
  }
}
