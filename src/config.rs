//! Store configuration
//!
//! Loadable from YAML:
//!
//! ```yaml
//! storage_folder: /var/lib/triplegate
//! index_definition: "spoc,posc,cosp"
//! enrichment_disabled: false
//! ```
//!
//! Missing keys take their defaults.

use crate::sail::DEFAULT_INDEXES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Folder used when none is configured
pub const DEFAULT_STORAGE_FOLDER: &str = "triplegate-data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings fixed when a store is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the engine's files; created if missing
    pub storage_folder: PathBuf,
    /// Comma-separated index orderings, e.g. `spoc,posc`
    pub index_definition: String,
    /// Ambient connections are plain instead of enriching
    pub enrichment_disabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_folder: PathBuf::from(DEFAULT_STORAGE_FOLDER),
            index_definition: DEFAULT_INDEXES.to_string(),
            enrichment_disabled: false,
        }
    }
}

impl StoreConfig {
    pub fn new(storage_folder: impl Into<PathBuf>) -> Self {
        Self {
            storage_folder: storage_folder.into(),
            ..Self::default()
        }
    }

    pub fn with_index_definition(mut self, definition: impl Into<String>) -> Self {
        self.index_definition = definition.into();
        self
    }

    pub fn with_enrichment_disabled(mut self, disabled: bool) -> Self {
        self.enrichment_disabled = disabled;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_folder, PathBuf::from(DEFAULT_STORAGE_FOLDER));
        assert_eq!(config.index_definition, "spoc,posc");
        assert!(!config.enrichment_disabled);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("/tmp/x")
            .with_index_definition("cspo")
            .with_enrichment_disabled(true);
        assert_eq!(config.storage_folder, PathBuf::from("/tmp/x"));
        assert_eq!(config.index_definition, "cspo");
        assert!(config.enrichment_disabled);
    }

    #[test]
    fn test_yaml_full() {
        let config = StoreConfig::from_yaml_str(
            "storage_folder: /data/store\nindex_definition: \"spoc,opsc\"\nenrichment_disabled: true\n",
        )
        .unwrap();
        assert_eq!(config.storage_folder, PathBuf::from("/data/store"));
        assert_eq!(config.index_definition, "spoc,opsc");
        assert!(config.enrichment_disabled);
    }

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = StoreConfig::from_yaml_str("storage_folder: /data/store\n").unwrap();
        assert_eq!(config.index_definition, DEFAULT_INDEXES);
        assert!(!config.enrichment_disabled);
    }

    #[test]
    fn test_yaml_invalid() {
        let err = StoreConfig::from_yaml_str("enrichment_disabled: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.yaml");
        std::fs::write(&path, "enrichment_disabled: true\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert!(config.enrichment_disabled);

        let missing = StoreConfig::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
