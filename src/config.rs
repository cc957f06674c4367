// Configuration loaded from YAML

use crate::medium::{Medium, MemoryMedium};
use crate::sqlite::SqliteMedium;
use crate::store::KeyValueStore;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which medium a configured store is opened on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumKind {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Medium backing the store
    pub medium: MediumKind,

    /// Directory the SQLite medium lives in (default: platform data dir)
    pub store_path: Option<PathBuf>,

    /// Maximum bytes the medium may hold
    pub quota_bytes: Option<usize>,
}

impl Config {
    /// `<config dir>/localstore/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("localstore").join("config.yaml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("config path '{}' was not found", path.display()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Effective store directory
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("localstore")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Open a store on the configured medium
    pub fn open_store(&self) -> Result<KeyValueStore<Box<dyn Medium>>> {
        let medium: Box<dyn Medium> = match self.medium {
            MediumKind::Memory => {
                let mut medium = MemoryMedium::new();
                if let Some(limit) = self.quota_bytes {
                    medium = medium.with_quota(limit);
                }
                Box::new(medium)
            }
            MediumKind::Sqlite => {
                let path = self.store_path();
                let mut medium = SqliteMedium::open(&path)
                    .with_context(|| format!("Failed to open store at {}", path.display()))?;
                if let Some(limit) = self.quota_bytes {
                    medium = medium.with_quota(limit);
                }
                Box::new(medium)
            }
        };

        Ok(KeyValueStore::new(medium))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.medium, MediumKind::Sqlite);
        assert!(config.quota_bytes.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml("medium: memory\nquota_bytes: 5242880\nstore_path: /tmp/ls\n").unwrap();
        assert_eq!(config.medium, MediumKind::Memory);
        assert_eq!(config.quota_bytes, Some(5_242_880));
        assert_eq!(config.store_path(), PathBuf::from("/tmp/ls"));
    }

    #[test]
    fn test_from_yaml_rejects_unknown_medium() {
        assert!(Config::from_yaml("medium: floppy\n").is_err());
    }

    #[test]
    fn test_load_explicit_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(Some(temp.path().join("missing.yaml").as_path())).unwrap_err();
        assert!(err.to_string().contains("was not found"));
    }

    #[test]
    fn test_load_explicit_file_and_open() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        fs::write(
            &config_path,
            format!("medium: sqlite\nstore_path: {}\n", temp.path().display()),
        )
        .unwrap();

        let config = Config::load(Some(config_path.as_path())).unwrap();
        assert_eq!(config.store_path(), temp.path());

        let mut store = config.open_store().unwrap();
        assert!(store.init_collection("tasks").unwrap());
        assert!(temp.path().join(".localstore/localstore.db").exists());
    }

    #[test]
    fn test_open_memory_store_with_quota() {
        let config = Config {
            medium: MediumKind::Memory,
            store_path: None,
            quota_bytes: Some(4),
        };

        let mut store = config.open_store().unwrap();
        assert!(store.set_raw("k", "12345").is_err());
        store.set_raw("k", "1").unwrap();
    }
}
