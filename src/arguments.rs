/// Centralized argument handling for ScoutBot
///
/// Consolidates command-line argument storage and debug flag checking so the
/// logger and services can query flags without re-parsing `env::args()`.
///
/// Features:
/// - Thread-safe CMD_ARGS storage
/// - Per-module `--debug-<module>` flag checkers
/// - Generic `has_arg` / `get_arg_value` utilities usable from tests
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Session orchestrator debug mode
pub fn is_debug_session_enabled() -> bool {
    has_arg("--debug-session")
}

/// Risk ledger debug mode
pub fn is_debug_risk_enabled() -> bool {
    has_arg("--debug-risk")
}

/// Position manager debug mode
pub fn is_debug_positions_enabled() -> bool {
    has_arg("--debug-positions")
}

/// Job scheduler debug mode
pub fn is_debug_scheduler_enabled() -> bool {
    has_arg("--debug-scheduler")
}

/// News calendar debug mode
pub fn is_debug_news_enabled() -> bool {
    has_arg("--debug-news")
}

/// Market calendar debug mode
pub fn is_debug_calendar_enabled() -> bool {
    has_arg("--debug-calendar")
}

/// Platform adapter debug mode
pub fn is_debug_platform_enabled() -> bool {
    has_arg("--debug-platform")
}

/// Health monitor debug mode
pub fn is_debug_health_enabled() -> bool {
    has_arg("--debug-health")
}

/// Global verbose mode
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Quiet mode (warnings and errors only)
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}
