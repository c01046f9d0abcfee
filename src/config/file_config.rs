//! Configuration file discovery and persistence.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! web_of_science = "your-clarivate-key"
//! scopus = "your-elsevier-key"
//! ncbi = "optional-ncbi-key"
//!
//! [endpoints]
//! classifier = "http://localhost:9000/classify"
//!
//! [search]
//! max_results_per_source = 100
//! request_timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//!
//! [enrichment]
//! enabled = true
//! batch_size = 200
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

const LOCAL_CONFIG_NAME: &str = "scholar-merge.toml";

/// Find a configuration file in the default locations
///
/// Checks `./scholar-merge.toml`, then `<config dir>/scholar-merge/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("scholar-merge").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Write the default configuration, refusing to clobber an existing file unless `force`
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }
    save_config(&Config::default(), path)
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0}")]
    Exists(String),
}
