//! Dual-output logging for the Hearth host.
//!
//! Records go to stdout (colored) and to `hearth.log` in the app log
//! directory (plain). Initialization is guarded so only the first call
//! installs the global logger.

use crate::error::HearthError;

use std::fmt::Arguments;
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "hearth.log";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Noisy dependencies capped below the host's own level.
const QUIET_TARGETS: [(&str, LevelFilter); 3] = [
    ("hyper", LevelFilter::Warn),
    ("reqwest", LevelFilter::Warn),
    ("tao", LevelFilter::Info),
];

/// Initialize stdout + file logging.
///
/// Safe to call more than once: later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`HearthError::Hearth`] if the log file cannot be created or a
/// global logger is already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), HearthError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = install(log_dir);
        if result.is_ok() {
            info!("Logger initialized with level {LOG_LEVEL:?} at {}", log_dir.join(LOG_FILE_NAME).display());
        }
    });

    result
}

#[track_caller]
fn install(log_dir: &Path) -> Result<(), HearthError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let log_file = fern::log_file(log_dir.join(LOG_FILE_NAME))
        .map_err(|e| HearthError::hearth(format!("Failed to create log file: {e}")))?;

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| write_line(out, message, record, colors.color(record.level())))
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, record.level()))
        .chain(log_file);

    QUIET_TARGETS
        .iter()
        .fold(Dispatch::new().level(LOG_LEVEL), |dispatch, (target, level)| {
            dispatch.level_for(*target, *level)
        })
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| HearthError::hearth(format!("Failed to initialize logger: {e}")))
}

fn write_line(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: impl std::fmt::Display,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
