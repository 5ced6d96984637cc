//! Configuration file discovery and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Logging configuration shared by every dataset binary
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Config file resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. Per-user config directory (`<config dir>/<app_name>/config.toml`)
/// 4. System-wide `/etc/<app_name>/config.toml` (Linux only)
///
/// Returns `None` when no candidate exists; running without a config file is
/// normal and every option then falls back to built-in defaults.
pub fn resolve_config_file(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    app_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument (returned even if missing so the
    // caller reports it instead of silently ignoring an explicit request)
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    let user_config = dirs::config_dir().map(|d| d.join(app_name).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System-wide config
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(app_name).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML document into `T`
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load and parse a TOML config file
///
/// A missing file is an error here: callers only pass paths that were
/// explicitly requested or discovered by [`resolve_config_file`].
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
    })?;
    let config = parse_toml(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration file");
    Ok(config)
}
