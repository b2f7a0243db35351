//! Logging bootstrap.
//!
//! # Responsibility
//! - Start file-based rolling logs, at most once per process, for hosts
//!   that want the engine's `event=...` lines persisted.
//!
//! # Invariants
//! - The engine never calls this itself; with no host opt-in every log
//!   macro is a no-op.
//! - The first successful call wins; later calls leave the active logger
//!   untouched.
//! - Initialization never panics; failures come back as strings.
//! - Log lines carry structural metadata only, never item payload text.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "agendablocks";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Starts rolling file logging under `log_dir`.
///
/// Whether or not logging is already active, `log_dir` must be absolute;
/// a host passing a relative path gets told so instead of silently writing
/// wherever the process happens to run. As a library the engine does not
/// negotiate re-initialization: once a logger is running, further calls
/// return `Ok(())` and change nothing.
///
/// # Errors
/// - Returns an error when `log_dir` is not absolute or cannot be created.
/// - Returns an error when `level` is not a level spec `flexi_logger`
///   accepts (`trace`..`error`, or a full `LogSpecification` string).
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), String> {
    if !log_dir.is_absolute() {
        return Err(format!(
            "log_dir must be an absolute path, got `{}`",
            log_dir.display()
        ));
    }
    if LOGGING_STATE.get().is_some() {
        return Ok(());
    }

    LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        std::fs::create_dir_all(log_dir).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                log_dir.display()
            )
        })?;

        let logger = Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        info!(
            "event=logging_init module=core status=ok level={level} log_dir={} version={}",
            log_dir.display(),
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            log_dir: log_dir.to_path_buf(),
            _logger: logger,
        })
    })?;

    Ok(())
}

/// Directory of the active log files, when logging has been started.
pub fn log_dir() -> Option<&'static Path> {
    LOGGING_STATE.get().map(|state| state.log_dir.as_path())
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}
