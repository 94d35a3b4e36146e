//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod parse;
pub mod process;
pub mod serve;

use std::path::{Path, PathBuf};

use slipscan_core::SlipscanConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slipscan")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else
/// defaults; then apply environment overrides.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SlipscanConfig> {
    let config = match config_path {
        Some(path) => SlipscanConfig::from_file(Path::new(path))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                SlipscanConfig::from_file(&default_path)?
            } else {
                SlipscanConfig::default()
            }
        }
    };
    Ok(config.with_env_overrides())
}
