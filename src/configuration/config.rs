use super::types::ServerConfig;
use crate::error_handling::types::ConfigError;
use log::info;
use std::fs;
use std::path::Path;

impl ServerConfig {
    /// Reads a configuration from a TOML file.
    ///
    /// Fields absent from the file keep their defaults, so a partial file is
    /// fine. Unknown keys are rejected to catch typos early.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from an optional file path, falling back to the
    /// built-in defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                info!("Loading configuration from {}", p.display());
                Self::from_file(p)
            }
            None => {
                info!("No configuration file given, using defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}
