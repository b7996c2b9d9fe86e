//! Startup configuration for the terminal application. There is no config
//! file; the few knobs come from the environment with defaults rooted in the
//! user's home directory.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog";
/// Subfolder holding the log file.
const LOG_DIR_NAME: &str = "logs";
/// Filter applied when neither override variable is set.
const DEFAULT_LOG_FILTER: &str = "library_catalog=info";

/// Overrides the directory the log file is written to.
pub const LOG_DIR_ENV: &str = "LIBRARY_CATALOG_LOG_DIR";
/// Overrides the tracing filter. `RUST_LOG` is honoured as a fallback.
pub const LOG_FILTER_ENV: &str = "LIBRARY_CATALOG_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `library-catalog.log`.
    pub log_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_dir = match non_blank(LOG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => default_log_dir()?,
        };
        let log_filter = non_blank(LOG_FILTER_ENV)
            .or_else(|| non_blank("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            log_dir,
            log_filter,
        })
    }
}

/// `~/.library-catalog/logs`.
fn default_log_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(LOG_DIR_NAME))
}
