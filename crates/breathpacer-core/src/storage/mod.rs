mod config;

pub use config::{Config, SessionSection};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/breathpacer[-dev]/` based on BREATHPACER_ENV.
///
/// Set BREATHPACER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREATHPACER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("breathpacer-dev")
    } else {
        base_dir.join("breathpacer")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
