//! Process-wide logger setup. The core only talks to the `log` facade;
//! verbosity is decided here, once, from the `JCDBG` environment variable.

use env_logger::Builder;
use log::LevelFilter;

use crate::constants::LOG_ENV;

/// Maps a `JCDBG` value to a level filter. Unknown or missing values keep
/// errors, warnings and informational messages.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    }
}

/// Installs the stderr logger.
pub fn init() {
    let level = level_from(std::env::var(LOG_ENV).ok().as_deref());
    Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}
