//! Reference dataset snapshots.
//!
//! A snapshot is a TOML document with three arrays of tables:
//!
//! ```toml
//! [[group]]
//! name = "Emoticons"
//!
//! [[character]]
//! codepoint = "1F600"
//! name = "GRINNING FACE"
//! group = "Emoticons"
//!
//! [[alias]]
//! codepoint = "0000"
//! alias = "NULL"
//! ```
//!
//! Rows that cannot be used (bad hex, unknown group, missing fields) are
//! skipped with a warning instead of failing the whole load.

use crate::codepoint_ty::Codepoint;
use crate::error::{Error, Result};
use crate::model::{UnicodeCharacter, UnicodeCharacterAlias, UnicodeGroup};
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const BUNDLED_SNAPSHOT: &str = include_str!("../data/bundled.toml");

static BUNDLED: Lazy<Result<Dataset, String>> =
    Lazy::new(|| Dataset::from_toml_str(BUNDLED_SNAPSHOT).map_err(|e| e.to_string()));

/// Group, character and alias tables, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    #[serde(rename = "group")]
    groups: Vec<UnicodeGroup>,
    #[serde(rename = "character")]
    characters: Vec<UnicodeCharacter>,
    #[serde(rename = "alias")]
    aliases: Vec<UnicodeCharacterAlias>,
    #[serde(skip)]
    group_names: HashSet<String>,
    #[serde(skip)]
    codepoints: HashSet<Codepoint>,
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(rename = "group", default)]
    groups: Vec<RawGroup>,
    #[serde(rename = "character", default)]
    characters: Vec<RawCharacter>,
    #[serde(rename = "alias", default)]
    aliases: Vec<RawAlias>,
}

#[derive(Deserialize)]
struct RawGroup {
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawCharacter {
    codepoint: Option<String>,
    name: Option<String>,
    group: Option<String>,
}

#[derive(Deserialize)]
struct RawAlias {
    codepoint: Option<String>,
    alias: Option<String>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Dataset::default()
    }

    /// Appends a group. Returns `false` if a group with that name already exists.
    pub fn push_group(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if !self.group_names.insert(name.clone()) {
            return false;
        }
        self.groups.push(UnicodeGroup::new(name));
        true
    }

    /// Appends a character. The group must exist and the codepoint must be new.
    pub fn push_character(
        &mut self,
        codepoint: Codepoint,
        name: impl Into<String>,
        group_name: impl Into<String>,
    ) -> bool {
        let group_name = group_name.into();
        if !self.group_names.contains(&group_name) || !self.codepoints.insert(codepoint) {
            return false;
        }
        self.characters.push(UnicodeCharacter {
            codepoint,
            name: name.into(),
            group_name,
        });
        true
    }

    /// Appends an alias, assigning the next surrogate id.
    pub fn push_alias(&mut self, codepoint: Codepoint, alias: impl Into<String>) -> u32 {
        let id = self.aliases.len() as u32 + 1;
        self.aliases.push(UnicodeCharacterAlias {
            id,
            codepoint,
            alias: alias.into(),
        });
        id
    }

    /// Groups in load order.
    pub fn groups(&self) -> &[UnicodeGroup] {
        &self.groups
    }

    /// Characters in load order.
    pub fn characters(&self) -> &[UnicodeCharacter] {
        &self.characters
    }

    /// Aliases in load order.
    pub fn aliases(&self) -> &[UnicodeCharacterAlias] {
        &self.aliases
    }

    /// Returns whether a character with this codepoint was pushed.
    pub fn contains(&self, codepoint: Codepoint) -> bool {
        self.codepoints.contains(&codepoint)
    }

    /// Returns whether the dataset has no characters.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Parses a TOML snapshot.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawDataset =
            toml::from_str(content).map_err(|e| Error::DatasetUnavailable(e.to_string()))?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawDataset) -> Self {
        let mut dataset = Dataset::new();
        let mut skipped = 0usize;

        for group in raw.groups {
            match group.name {
                Some(name) if !name.is_empty() => {
                    if !dataset.push_group(name.clone()) {
                        debug!("duplicate group {:?} ignored", name);
                    }
                }
                _ => {
                    warn!("group without a name, skipping");
                    skipped += 1;
                }
            }
        }

        for ch in raw.characters {
            let Some(hex) = ch.codepoint else {
                warn!("character without a codepoint, skipping");
                skipped += 1;
                continue;
            };
            let codepoint = match Codepoint::from_hex(&hex) {
                Ok(cp) => cp,
                Err(e) => {
                    warn!("{}, skipping", e);
                    skipped += 1;
                    continue;
                }
            };
            let group = ch.group.unwrap_or_default();
            if !dataset.push_character(codepoint, ch.name.unwrap_or_default(), group.as_str()) {
                warn!(
                    "character {} is a duplicate or names unknown group {:?}, skipping",
                    codepoint, group
                );
                skipped += 1;
            }
        }

        for alias in raw.aliases {
            let (Some(hex), Some(text)) = (alias.codepoint, alias.alias) else {
                warn!("alias without codepoint or text, skipping");
                skipped += 1;
                continue;
            };
            match Codepoint::from_hex(&hex) {
                Ok(cp) if dataset.contains(cp) => {
                    dataset.push_alias(cp, text);
                }
                Ok(cp) => {
                    warn!("alias {:?} for unknown character {}, skipping", text, cp);
                    skipped += 1;
                }
                Err(e) => {
                    warn!("{}, skipping", e);
                    skipped += 1;
                }
            }
        }

        debug!(
            "parsed dataset: {} groups, {} characters, {} aliases, {} rows skipped",
            dataset.groups.len(),
            dataset.characters.len(),
            dataset.aliases.len(),
            skipped
        );
        dataset
    }

    /// Serializes the dataset as a TOML snapshot.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::storage("serializing dataset snapshot", e))
    }

    /// Reads a TOML snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::DatasetUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Writes a TOML snapshot to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        fs::write(path, content)
            .map_err(|e| Error::storage(format!("writing {}", path.display()), e))
    }

    /// The snapshot compiled into the crate.
    pub fn bundled() -> Result<Self> {
        BUNDLED
            .as_ref()
            .map(Clone::clone)
            .map_err(|e| Error::DatasetUnavailable(format!("bundled snapshot: {}", e)))
    }
}

/// Where the catalog's reference data comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DatasetSource {
    /// The snapshot compiled into the crate.
    #[default]
    Bundled,
    /// A TOML snapshot file.
    Snapshot(PathBuf),
    /// A directory holding `Blocks.txt`, `UnicodeData.txt` and optionally `NameAliases.txt`.
    Ucd(PathBuf),
}

impl DatasetSource {
    /// Loads the dataset this source points at.
    pub fn load(&self) -> Result<Dataset> {
        match self {
            DatasetSource::Bundled => Dataset::bundled(),
            DatasetSource::Snapshot(path) => Dataset::load(path),
            DatasetSource::Ucd(dir) => crate::ucd::import_dir(dir),
        }
    }
}
