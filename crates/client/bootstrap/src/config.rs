//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use store_runtime::StoreConfig;

use crate::dirs;

/// Configuration required to bootstrap the store and logging.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub save_dir: PathBuf,
    pub log_dir: PathBuf,
    pub event_buffer_size: usize,
    pub autosave: bool,
    /// Storefront environment label, e.g. `sandbox` or `production`.
    pub storefront_env: String,
}

impl AppConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TRIVIA_SAVE_DIR` - Directory for saved book statuses (default: platform-specific)
    /// - `TRIVIA_LOG_DIR` - Directory for `store.log` (default: platform-specific)
    /// - `TRIVIA_EVENT_BUFFER` - Event bus capacity per topic (default: 64)
    /// - `TRIVIA_AUTOSAVE` - Save after every shelf change (default: true)
    /// - `TRIVIA_STOREFRONT_ENV` - Storefront environment label (default: sandbox)
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Construct configuration from an arbitrary key lookup.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("TRIVIA_SAVE_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("TRIVIA_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Some(capacity) = read_env::<usize>(&lookup, "TRIVIA_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(enable) = read_env::<bool>(&lookup, "TRIVIA_AUTOSAVE") {
            config.autosave = enable;
        }

        if let Some(storefront_env) = lookup("TRIVIA_STOREFRONT_ENV")
            && !storefront_env.is_empty()
        {
            config.storefront_env = storefront_env;
        }

        config
    }

    /// Store configuration saving into [`Self::save_dir`].
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            event_buffer_size: self.event_buffer_size,
            autosave: self.autosave,
            ..StoreConfig::in_dir(&self.save_dir)
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_dir: dirs::data_dir(),
            log_dir: dirs::log_dir(),
            event_buffer_size: StoreConfig::DEFAULT_EVENT_BUFFER_SIZE,
            autosave: true,
            storefront_env: "sandbox".to_string(),
        }
    }
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
