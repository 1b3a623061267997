//! Centralized path resolution for ScoutBot
//!
//! All file and directory paths are resolved through this module so behavior
//! is consistent across platforms:
//! - **macOS**: `~/Library/Application Support/ScoutBot/`
//! - **Windows**: `%LOCALAPPDATA%\ScoutBot\`
//! - **Linux**: `$XDG_DATA_HOME/ScoutBot/` (fallback `~/.local/share/ScoutBot/`)
//!
//! Directory structure:
//!
//! ```text
//! ScoutBot/
//! ├── data/
//! │   ├── config.json
//! │   ├── risk_state.json
//! │   └── system_state.json
//! └── logs/
//!     └── scoutbot_*.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "ScoutBot";

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

/// Resolves the base directory for all ScoutBot data
fn resolve_base_directory() -> PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

/// Returns the base directory for all ScoutBot data
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Returns the data directory (config and persisted state)
pub fn get_data_directory() -> PathBuf {
    get_base_directory().join("data")
}

/// Returns the logs directory
pub fn get_logs_directory() -> PathBuf {
    get_base_directory().join("logs")
}

/// Default config file location
pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.json")
}

/// Risk ledger state file
pub fn get_risk_state_path() -> PathBuf {
    get_data_directory().join("risk_state.json")
}

/// Generic key-value system state file
pub fn get_system_state_path() -> PathBuf {
    get_data_directory().join("system_state.json")
}

/// Creates all required directories if they do not exist
///
/// Must be called before logger initialization so log files can be created.
pub fn ensure_all_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_data_directory())?;
    std::fs::create_dir_all(get_logs_directory())?;
    Ok(())
}
