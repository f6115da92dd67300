//! Configuration manager for TOML file operations
//!
//! This module provides the `ControllerConfigManager` which handles loading
//! and saving the persisted cluster-controller list.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::ControllerEntry;

const CONTROLLERS_FILE: &str = "controllers.toml";

/// Wrapper for serializing the controller list
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct ControllersFile {
    #[serde(default)]
    controllers: Vec<ControllerEntry>,
}

/// Configuration manager for `bdcconn`
///
/// Persists the saved controller list in TOML format. Configuration is
/// stored in `~/.config/bdcconn/` by default.
#[derive(Debug, Clone)]
pub struct ControllerConfigManager {
    /// Base directory for configuration files
    config_dir: PathBuf,
}

impl ControllerConfigManager {
    /// Creates a new manager with the default configuration directory
    ///
    /// The default directory is `~/.config/bdcconn/`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?
            .join("bdcconn");
        Ok(Self { config_dir })
    }

    /// Creates a new manager with a custom configuration directory
    ///
    /// This is useful for testing or non-standard configurations.
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensures the configuration directory exists
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::Write(format!(
                    "Failed to create config directory {}: {}",
                    self.config_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Loads the persisted controller list
    ///
    /// Returns an empty vector if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_controllers(&self) -> ConfigResult<Vec<ControllerEntry>> {
        let path = self.config_dir.join(CONTROLLERS_FILE);
        Self::load_toml_file::<ControllersFile>(&path).map(|f| f.controllers)
    }

    /// Saves the controller list
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_controllers(&self, controllers: &[ControllerEntry]) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(CONTROLLERS_FILE);
        let file = ControllersFile {
            controllers: controllers.to_vec(),
        };
        Self::save_toml_file(&path, &file)
    }

    fn load_toml_file<T: serde::de::DeserializeOwned + Default>(path: &Path) -> ConfigResult<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    fn save_toml_file<T: serde::Serialize>(path: &Path, value: &T) -> ConfigResult<()> {
        let contents =
            toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents)
            .map_err(|e| ConfigError::Write(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let manager = ControllerConfigManager::with_config_dir(temp.path().to_path_buf());
        assert!(manager.load_controllers().unwrap().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let manager = ControllerConfigManager::with_config_dir(temp.path().to_path_buf());

        let entries = vec![
            ControllerEntry {
                url: "https://a:30080".to_string(),
                username: "admin".to_string(),
                password: Some("pw".to_string()),
            },
            ControllerEntry {
                url: "https://b:30080".to_string(),
                username: "admin".to_string(),
                password: None,
            },
        ];
        manager.save_controllers(&entries).unwrap();

        let loaded = manager.load_controllers().unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn garbage_file_is_a_deserialize_error() {
        let temp = TempDir::new().unwrap();
        let manager = ControllerConfigManager::with_config_dir(temp.path().to_path_buf());
        std::fs::write(temp.path().join("controllers.toml"), "not [ valid toml").unwrap();

        let err = manager.load_controllers().unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }
}
