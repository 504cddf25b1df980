use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{Subscriber, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::config_directory;

const LOG_FILE_NAME: &str = "favkit.log";
/// Overrides `RUST_LOG` when set to a non-empty filter.
pub const LOG_ENV_VAR: &str = "FAVKIT_LOG";

/// Where structured logs go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingDestination {
    /// JSON file plus readable stderr (CLI).
    FileAndStderr,
    /// JSON file only (GUI).
    FileOnly,
    /// Readable stderr only.
    StderrOnly,
}

impl LoggingDestination {
    fn writes_file(self) -> bool {
        !matches!(self, LoggingDestination::StderrOnly)
    }

    fn writes_stderr(self) -> bool {
        !matches!(self, LoggingDestination::FileOnly)
    }
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[derive(Debug)]
struct LoggingGuards {
    _guard: Option<WorkerGuard>,
    log_path: Option<PathBuf>,
}

static LOGGING_STATE: OnceLock<LoggingGuards> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global structured logging subscriber.
///
/// The first call wins; subsequent calls are no-ops that return the resolved log file path.
pub fn init_logging(
    destination: LoggingDestination,
) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let guards = install_logging(destination)?;
        if let Err(guards) = LOGGING_STATE.set(guards) {
            drop(guards);
        }
    }

    Ok(LOGGING_STATE
        .get()
        .and_then(|guards| guards.log_path.as_ref()))
}

/// Returns the log file path selected during logging initialization (if any).
pub fn current_log_path() -> Option<&'static PathBuf> {
    LOGGING_STATE
        .get()
        .and_then(|guards| guards.log_path.as_ref())
}

fn install_logging(destination: LoggingDestination) -> Result<LoggingGuards, LoggingError> {
    let registry = tracing_subscriber::registry().with(build_filter()?);

    let (file_layer, guard, log_path) = if destination.writes_file() {
        let (layer, guard, path) = json_file_layer(&log_directory())?;
        (Some(layer), Some(guard), Some(path))
    } else {
        (None, None, None)
    };
    let stderr_layer = destination.writes_stderr().then(stderr_layer);

    registry.with(file_layer).with(stderr_layer).try_init()?;

    if let Some(path) = &log_path {
        info!(path = %path.display(), "Structured logging enabled");
    }
    Ok(LoggingGuards {
        _guard: guard,
        log_path,
    })
}

fn json_file_layer<S>(dir: &Path) -> io::Result<(BoxedLayer<S>, WorkerGuard, PathBuf)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with_writer(writer)
        .with_ansi(false)
        .boxed();
    Ok((layer, guard, dir.join(LOG_FILE_NAME)))
}

fn stderr_layer<S>() -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_timer(LocalTime::rfc_3339())
                .with_target(false),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .boxed()
}

/// Directory holding the persistent JSON log.
pub fn log_directory() -> PathBuf {
    config_directory().join("logs")
}

/// `FAVKIT_LOG`, then `RUST_LOG`, then `info`.
fn build_filter() -> Result<EnvFilter, ParseError> {
    match env::var(LOG_ENV_VAR) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec),
        _ => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directory_lives_under_config() {
        let dir = log_directory();
        assert!(dir.starts_with(config_directory()));
        assert!(dir.ends_with("logs"));
    }

    #[test]
    fn destinations_select_layers() {
        assert!(LoggingDestination::FileAndStderr.writes_file());
        assert!(LoggingDestination::FileAndStderr.writes_stderr());
        assert!(!LoggingDestination::FileOnly.writes_stderr());
        assert!(!LoggingDestination::StderrOnly.writes_file());
    }

    #[test]
    fn stderr_only_has_no_log_file() {
        let path = init_logging(LoggingDestination::StderrOnly).expect("install subscriber");
        assert!(path.is_none());
        assert!(current_log_path().is_none());
    }
}
