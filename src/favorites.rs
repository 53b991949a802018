//! The favorites store.
//!
//! Favorites live in a `RwLock`ed table. Reads share the lock; writes hold it
//! exclusively across "check, persist, publish", so inserting a codepoint is a
//! single atomic insert-if-absent and no caller ever sees a duplicate.
//!
//! File-backed stores keep a TOML document:
//!
//! ```toml
//! next_id = 3
//!
//! [[favorite]]
//! id = 1
//! codepoint = "1F600"
//!
//! [[favorite]]
//! id = 2
//! codepoint = "2764"
//! ```
//!
//! Every write replaces the file atomically (temp file, fsync, rename) before
//! the in-memory table changes, so a failed write leaves both untouched.

use crate::catalog::Catalog;
use crate::codepoint_ty::Codepoint;
use crate::error::{Error, Result};
use crate::model::{Favorite, NamedCharacter};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tempfile::NamedTempFile;

// TOML integers are signed 64-bit
const MAX_ID: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FavoritesTable {
    #[serde(default, serialize_with = "serialize_next_id")]
    next_id: u64,
    #[serde(rename = "favorite", default)]
    favorites: Vec<Favorite>,
}

fn serialize_next_id<S>(next_id: &u64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64((*next_id).min(MAX_ID))
}

impl FavoritesTable {
    fn contains(&self, codepoint: Codepoint) -> bool {
        self.favorites.iter().any(|f| f.codepoint == codepoint)
    }

    fn push(&mut self, codepoint: Codepoint) -> Favorite {
        let favorite = Favorite {
            id: self.next_id,
            codepoint,
        };
        self.next_id += 1;
        self.favorites.push(favorite);
        favorite
    }

    /// Sorts by id, drops repeated codepoints (keeping the earliest) and makes
    /// `next_id` larger than every id. Returns the number of rows dropped.
    fn normalize(&mut self) -> usize {
        self.favorites.sort_by_key(|f| f.id);
        let before = self.favorites.len();
        let mut seen = HashSet::new();
        self.favorites.retain(|f| seen.insert(f.codepoint));
        let max_id = self.favorites.last().map_or(0, |f| f.id);
        self.next_id = self.next_id.max(max_id.saturating_add(1)).max(1);
        before - self.favorites.len()
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Memory,
    File(PathBuf),
}

/// A durable set of favorite codepoints, iterated in insertion order.
#[derive(Debug)]
pub struct FavoritesStore {
    storage: Storage,
    table: RwLock<FavoritesTable>,
}

impl FavoritesStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        let mut table = FavoritesTable::default();
        table.normalize();
        FavoritesStore {
            storage: Storage::Memory,
            table: RwLock::new(table),
        }
    }

    /// Opens the store kept at `path`. A missing file is an empty store; the
    /// file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut table = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<FavoritesTable>(&content).map_err(|e| {
                Error::storage(format!("parsing favorites file {}", path.display()), e)
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no favorites file at {}, starting empty", path.display());
                FavoritesTable::default()
            }
            Err(e) => {
                return Err(Error::storage(
                    format!("reading favorites file {}", path.display()),
                    e,
                ))
            }
        };
        let dropped = table.normalize();
        if dropped > 0 {
            warn!(
                "{} duplicate favorites collapsed in {}",
                dropped,
                path.display()
            );
        }
        info!(
            "opened favorites store {} ({} favorites)",
            path.display(),
            table.favorites.len()
        );
        Ok(FavoritesStore {
            storage: Storage::File(path),
            table: RwLock::new(table),
        })
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Memory => None,
            Storage::File(path) => Some(path),
        }
    }

    fn read_table(&self) -> RwLockReadGuard<'_, FavoritesTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, FavoritesTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, table: &FavoritesTable) -> Result<()> {
        let path = match &self.storage {
            Storage::Memory => return Ok(()),
            Storage::File(path) => path,
        };
        let content = toml::to_string(table)
            .map_err(|e| Error::storage("serializing favorites", e))?;
        write_atomically(path, content.as_bytes())
            .map_err(|e| Error::storage(format!("writing favorites file {}", path.display()), e))
    }

    /// Applies `change` to a copy of the table; if it reports a change, the
    /// copy is persisted and then published.
    fn update<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut FavoritesTable) -> Result<(T, bool)>,
    {
        let mut table = self.write_table();
        let mut next = table.clone();
        let (outcome, changed) = change(&mut next)?;
        if changed {
            self.persist(&next)?;
            *table = next;
        }
        Ok(outcome)
    }

    /// Adds `codepoint`, failing with `AlreadyFavorite` if it is present.
    pub fn add(&self, codepoint: Codepoint) -> Result<Favorite> {
        let favorite = self.update(|table| {
            if table.contains(codepoint) {
                return Err(Error::AlreadyFavorite(codepoint));
            }
            if table.next_id > MAX_ID {
                return Err(Error::storage(
                    "adding favorite",
                    format!("favorite ids exhausted at {}", table.next_id),
                ));
            }
            Ok((table.push(codepoint), true))
        })?;
        debug!("favorite #{} added: {}", favorite.id, codepoint);
        Ok(favorite)
    }

    /// Removes `codepoint`. Returns the number of rows removed, 0 or 1.
    pub fn remove(&self, codepoint: Codepoint) -> Result<usize> {
        let removed = self.remove_where(|f| f.codepoint == codepoint)?;
        debug!("favorite {} removed: {} rows", codepoint, removed);
        Ok(removed)
    }

    /// Removes the favorite with surrogate key `id`. Returns 0 or 1.
    pub fn remove_by_id(&self, id: u64) -> Result<usize> {
        self.remove_where(|f| f.id == id)
    }

    /// Removes favorites whose character `catalog` does not know.
    pub fn prune_missing(&self, catalog: &Catalog) -> Result<usize> {
        let pruned = self.remove_where(|f| catalog.get_character(f.codepoint).is_none())?;
        if pruned > 0 {
            info!("pruned {} favorites missing from the catalog", pruned);
        }
        Ok(pruned)
    }

    fn remove_where<P>(&self, mut doomed: P) -> Result<usize>
    where
        P: FnMut(&Favorite) -> bool,
    {
        self.update(|table| {
            let before = table.favorites.len();
            table.favorites.retain(|f| !doomed(f));
            let removed = before - table.favorites.len();
            Ok((removed, removed > 0))
        })
    }

    /// Favorites in insertion order.
    pub fn list(&self) -> Vec<Favorite> {
        self.read_table().favorites.clone()
    }

    /// Returns whether `codepoint` is a favorite.
    pub fn is_favorite(&self, codepoint: Codepoint) -> bool {
        self.read_table().contains(codepoint)
    }

    /// Returns the number of favorites.
    pub fn len(&self) -> usize {
        self.read_table().favorites.len()
    }

    /// Returns whether there are no favorites.
    pub fn is_empty(&self) -> bool {
        self.read_table().favorites.is_empty()
    }

    /// Favorites joined with `catalog` for display.
    ///
    /// Favorites whose character is gone still appear, named with the
    /// unnamed placeholder.
    pub fn named(&self, catalog: &Catalog) -> Vec<NamedCharacter> {
        self.list()
            .into_iter()
            .map(|favorite| {
                let mut named = catalog.named(favorite.codepoint);
                named.favorite_id = Some(favorite.id);
                named
            })
            .collect()
    }
}

fn write_atomically(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    #[cfg(unix)]
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}
