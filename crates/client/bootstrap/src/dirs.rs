//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache and data directories.

use std::path::PathBuf;

use directories::ProjectDirs;

const APP_NAME: &str = "hp-trivia";

/// Get the platform-specific data directory for saved book statuses
///
/// Follows platform conventions:
/// - macOS: `~/Library/Application Support/hp-trivia`
/// - Linux: `~/.local/share/hp-trivia` (or `$XDG_DATA_HOME/hp-trivia`)
/// - Windows: `%APPDATA%\hp-trivia`
/// - Fallback: `./save_data`
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/hp-trivia/logs`
/// - Linux: `~/.cache/hp-trivia/logs` (or `$XDG_CACHE_HOME/hp-trivia/logs`)
/// - Windows: `%LOCALAPPDATA%\hp-trivia\logs`
/// - Fallback: `/tmp/hp-trivia/logs`
pub fn log_dir() -> PathBuf {
    let base_dir = ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME));

    base_dir.join("logs")
}
