//! Local fallback collections for signed-out visitors.
//!
//! Guests get no ownership rows on the server. Their collection lives in a
//! per-kind JSON id list under a fixed storage key, mirroring what the web
//! client keeps in browser storage, so the toggle works offline and the
//! ownership filter still has something to read.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::ItemKind;

/// Errors from reading or writing a guest collection file.
#[derive(Debug, Error)]
pub enum GuestError {
    #[error("failed to read guest collection {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write guest collection {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("guest collection {path} is not a JSON id list: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no user data directory found; pass an explicit guest store location")]
    NoDataDir,
}

/// Directory-backed store of per-kind guest id lists.
///
/// Adding never deduplicates, so toggling an item on repeatedly stacks
/// copies of its id; a remove drops every copy at once. Readers that need
/// set semantics go through [`GuestStore::contains`].
#[derive(Debug, Clone)]
pub struct GuestStore {
    dir: PathBuf,
}

impl GuestStore {
    pub fn open(dir: impl Into<PathBuf>) -> GuestStore {
        GuestStore { dir: dir.into() }
    }

    /// Store under the platform user data directory.
    pub fn default_location() -> Result<GuestStore, GuestError> {
        let base = dirs::data_dir().ok_or(GuestError::NoDataDir)?;
        Ok(GuestStore::open(base.join("dungeoneer").join("guest")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: ItemKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.storage_key()))
    }

    /// The stored id list for a kind. A missing file is an empty list.
    pub fn ids(&self, kind: ItemKind) -> Result<Vec<String>, GuestError> {
        let path = self.path_for(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(GuestError::Read { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| GuestError::Malformed { path, source })
    }

    pub fn contains(&self, kind: ItemKind, item_id: &str) -> Result<bool, GuestError> {
        Ok(self.ids(kind)?.iter().any(|id| id == item_id))
    }

    /// Appends an id to the stored list.
    pub fn add(&self, kind: ItemKind, item_id: &str) -> Result<(), GuestError> {
        let mut ids = self.ids(kind)?;
        ids.push(item_id.to_string());
        self.write(kind, &ids)
    }

    /// Removes every copy of an id. A missing file stays missing.
    pub fn remove(&self, kind: ItemKind, item_id: &str) -> Result<(), GuestError> {
        let mut ids = self.ids(kind)?;
        let before = ids.len();
        ids.retain(|id| id != item_id);
        if ids.len() == before && !self.path_for(kind).exists() {
            return Ok(());
        }
        self.write(kind, &ids)
    }

    /// Drops the stored list for a kind entirely.
    pub fn clear(&self, kind: ItemKind) -> Result<(), GuestError> {
        let path = self.path_for(kind);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GuestError::Write { path, source }),
        }
    }

    fn write(&self, kind: ItemKind, ids: &[String]) -> Result<(), GuestError> {
        let path = self.path_for(kind);
        fs::create_dir_all(&self.dir).map_err(|source| GuestError::Write {
            path: path.clone(),
            source,
        })?;
        let payload = serde_json::to_vec(ids).map_err(|source| GuestError::Malformed {
            path: path.clone(),
            source,
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| {
            GuestError::Write {
                path: path.clone(),
                source,
            }
        })?;
        tmp.write_all(&payload).map_err(|source| GuestError::Write {
            path: path.clone(),
            source,
        })?;
        tmp.persist(&path).map_err(|err| GuestError::Write {
            path,
            source: err.error,
        })?;
        Ok(())
    }
}
