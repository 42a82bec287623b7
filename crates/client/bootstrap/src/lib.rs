//! Shared bootstrap utilities for the trivia client.
//!
//! Provides configuration loading, platform directories, logging setup, and
//! the startup sequence that runs against a built [`store_runtime::Store`].
pub mod config;
pub mod dirs;
pub mod logging;
pub mod startup;

pub use config::AppConfig;
pub use logging::setup_logging;
pub use startup::{StartupReport, run_startup};
