//! cloudweave configuration
//!
//! Finds and loads the YAML config file: metadata store backend, reconciler
//! budgets and named connection profiles.

pub mod error;
pub mod model;

pub use error::*;
pub use model::{
    Config, ConnectionProfile, PolicySettings, ReconcilerSettings, StoreConfig,
    default_store_path, expand_env,
};

use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "CLOUDWEAVE_CONFIG_PATH";
const LOCAL_CONFIG_FILE: &str = "cloudweave.yaml";
const PROJECT_DIR: &str = ".cloudweave";
const CONFIG_FILE: &str = "config.yaml";

/// `~/.config/cloudweave`, created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("cloudweave");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the config file
///
/// Search order:
/// 1. `CLOUDWEAVE_CONFIG_PATH` (direct path)
/// 2. `./cloudweave.yaml`
/// 3. `./.cloudweave/config.yaml`
/// 4. `~/.config/cloudweave/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points to {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    let local = current_dir.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(local);
    }

    let project = current_dir.join(PROJECT_DIR).join(CONFIG_FILE);
    if project.exists() {
        return Ok(project);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cloudweave").join(CONFIG_FILE);
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Load `explicit` when given, otherwise the first file [`find_config_file`] finds
pub fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, Config)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    let config = Config::load(&path)?;
    Ok((path, config))
}
