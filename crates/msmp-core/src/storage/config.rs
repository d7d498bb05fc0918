//! Client configuration storage

use crate::{models::ClientConfig, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

pub struct ConfigStorage {
    config_dir: PathBuf,
}

impl ConfigStorage {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Storage rooted at the platform config directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(super::init_config_dir()?))
    }

    pub fn path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load the stored configuration, writing the default on first use
    pub fn load(&self) -> Result<ClientConfig> {
        let config_path = self.path();

        if !config_path.exists() {
            let config = ClientConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load and validate a configuration file without touching the store
    pub fn load_from(path: &Path) -> Result<ClientConfig> {
        let content = std::fs::read_to_string(path)?;

        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        let config: ClientConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        std::fs::create_dir_all(&self.config_dir)?;

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.path(), content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("msmp"));

        let config = storage.load().unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(storage.path().exists());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());

        let config = ClientConfig::new("wss://mc.example.com:25585").with_secret("token");
        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap(), config);
    }

    #[test]
    fn test_empty_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().to_path_buf());
        std::fs::write(storage.path(), "  \n").unwrap();

        assert_eq!(storage.load().unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, r#"{"url": "http://nope"}"#).unwrap();

        let err = ConfigStorage::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
