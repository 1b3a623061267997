/// Logger configuration and command-line flag scanning
///
/// Holds the runtime filtering rules: minimum level threshold and the set of
/// tags with `--debug-<module>` enabled.
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments::{get_cmd_args, is_quiet_enabled, is_verbose_enabled};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum level that is displayed (Debug/Verbose still need flags)
    pub min_level: LogLevel,
    /// Tags with --debug-<module> enabled
    pub debug_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Get a snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

/// Replace the logger configuration (used by tests)
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Initialize configuration from command-line arguments
///
/// Scans for `--debug-<module>` flags, `--verbose` and `--quiet`.
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if is_verbose_enabled() {
        config.min_level = LogLevel::Verbose;
    } else if is_quiet_enabled() {
        config.min_level = LogLevel::Warning;
    }

    for arg in get_cmd_args() {
        if let Some(module) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(module.to_lowercase());
        }
    }

    set_logger_config(config);
}

/// Check if debug output is enabled for a tag
pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.debug_tags.contains(&tag.to_debug_key())
}
