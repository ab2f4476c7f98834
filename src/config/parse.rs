//! Task file parsing and discovery

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, TerraskError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default task file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["terrask.yml", "terrask.yaml"];

/// Find the task file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the task file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a task file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, TerraskError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read file: {}", e)))?;

    parse_config(&contents)
}

/// Parse configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config, TerraskError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parse configuration with automatic file discovery
pub fn parse_config_auto() -> Result<(Config, PathBuf), TerraskError> {
    let config_path = find_config_file()?;
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}

/// Load a `.env` file sitting next to the task file, if there is one
///
/// Variables already set in the environment win.
pub fn load_env_file(config_path: &Path) -> ConfigResult<Option<PathBuf>> {
    let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let env_path = dir.join(".env");

    if !env_path.is_file() {
        return Ok(None);
    }

    dotenvy::from_path(&env_path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to load {}: {}", env_path.display(), e))
    })?;
    debug!(path = %env_path.display(), "loaded environment file");

    Ok(Some(env_path))
}
