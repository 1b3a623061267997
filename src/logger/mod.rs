//! Structured logging system for ScoutBot
//!
//! Provides a clean logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via `--debug-<module>` flags
//! - Dual output: colored console + file persistence
//!
//! ## Usage
//!
//! ```rust
//! use scoutbot::logger::{self, LogTag};
//!
//! logger::info(LogTag::Session, "Scan admitted");
//! logger::warning(LogTag::Risk, "Daily loss limit 80% consumed");
//! logger::debug(LogTag::Scheduler, "Tick details: ..."); // Only with --debug-scheduler
//! ```
//!
//! Call `logger::init()` once at startup, after `paths::ensure_all_directories()`.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags and opens the log file.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (only shown when `--debug-<module>` is provided)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only shown with `--verbose`)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call during shutdown to ensure logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}
