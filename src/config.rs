use crate::catalog::DEFAULT_SEARCH_LIMIT;
use crate::dataset::DatasetSource;
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_FAVORITES_FILE: &str = "favorites.toml";

/// Runtime settings, read from a TOML file.
///
/// Every field is optional in the file:
///
/// ```toml
/// favorites_path = "/var/lib/uniquity/favorites.toml"
/// search_limit = 100
///
/// [dataset]
/// kind = "ucd"
/// path = "/usr/share/unicode"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where reference data is loaded from.
    pub dataset: DatasetSource,
    /// File holding the favorites.
    pub favorites_path: PathBuf,
    /// Maximum number of search results.
    pub search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset: DatasetSource::default(),
            favorites_path: PathBuf::from(DEFAULT_FAVORITES_FILE),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Config {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("reading config from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Checks values the type system does not.
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            return Err(Error::InvalidConfig("search_limit must be positive".into()));
        }
        if self.favorites_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("favorites_path is empty".into()));
        }
        Ok(())
    }
}
