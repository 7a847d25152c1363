//! Local JSON document store
//!
//! Two collections live as whole JSON documents under the data directory:
//!
//! - `users.json`    - accounts, denormalized per-user statistics
//! - `analyses.json` - every saved analysis plus collection-wide counters
//!
//! Every operation loads the full document, scans it, mutates it in memory
//! and writes the full document back (temp file + rename). There is no
//! partial update and no transaction spanning the two documents: saving an
//! analysis writes analyses.json first and users.json second.
//!
//! On first load a collection is copied from the optional seed directory,
//! or created from defaults when no usable seed exists. A corrupt document
//! in the data directory is reported, never overwritten.

mod analyses;
mod models;
mod users;

pub use models::*;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::StorageConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The {collection} document is corrupt: {source}")]
    Corrupt {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize the {collection} document: {source}")]
    Serialize {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("An account already exists for {0}")]
    DuplicateEmail(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("The user limit ({0}) has been reached")]
    CapacityReached(usize),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collections
// ─────────────────────────────────────────────────────────────────────────────

/// The two persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Analyses,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Analyses => "analyses",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Users => "users.json",
            Self::Analyses => "analyses.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A whole-collection document
pub trait Document: Serialize + DeserializeOwned + Default {
    const COLLECTION: Collection;

    /// Stamp `metadata.lastUpdated` before a save
    fn stamp(&mut self, now: DateTime<Utc>);
}

impl Document for UsersDocument {
    const COLLECTION: Collection = Collection::Users;

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.metadata.last_updated = now;
        self.metadata.total_users = self.users.len();
    }
}

impl Document for AnalysesDocument {
    const COLLECTION: Collection = Collection::Analyses;

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.metadata.last_updated = now;
        self.metadata.total_analyses = self.analyses.len();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to the document store on disk
#[derive(Debug, Clone)]
pub struct DataStore {
    data_dir: PathBuf,
    seed_dir: Option<PathBuf>,
}

impl DataStore {
    /// Open the store, creating the data directory if needed
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| StoreError::io(&config.data_dir, e))?;

        Ok(Self {
            data_dir: config.data_dir.clone(),
            seed_dir: config.seed_dir.clone(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    /// Load a collection document
    ///
    /// Order: data directory -> seed directory -> defaults. Whatever is found
    /// first on a cache miss is written to the data directory.
    pub fn load<D: Document>(&self) -> Result<D, StoreError> {
        let collection = D::COLLECTION;
        let path = self.document_path(collection);

        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!("Loading {} from {}", collection, path.display());
                return serde_json::from_slice(&bytes)
                    .map_err(|source| StoreError::Corrupt { collection, source });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&path, e)),
        }

        let mut document = self.load_seed::<D>().unwrap_or_default();
        self.save(&mut document)?;
        Ok(document)
    }

    /// Read the seed document for a collection, if one exists and parses
    fn load_seed<D: Document>(&self) -> Option<D> {
        let collection = D::COLLECTION;
        let seed_path = self.seed_dir.as_ref()?.join(collection.file_name());

        let bytes = match fs::read(&seed_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(
                    "No seed for {} at {}: {}, using defaults",
                    collection,
                    seed_path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => {
                tracing::info!("Seeded {} from {}", collection, seed_path.display());
                Some(document)
            }
            Err(e) => {
                tracing::warn!(
                    "Seed file {} is malformed ({}), using defaults",
                    seed_path.display(),
                    e
                );
                None
            }
        }
    }

    /// Stamp and overwrite the whole document
    pub fn save<D: Document>(&self, document: &mut D) -> Result<(), StoreError> {
        let collection = D::COLLECTION;
        document.stamp(Utc::now());

        let json = serde_json::to_vec_pretty(document)
            .map_err(|source| StoreError::Serialize { collection, source })?;

        let path = self.document_path(collection);
        write_atomic(&path, &json)?;
        tracing::debug!("Saved {} ({} bytes)", collection, json.len());
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    /// Store rooted in a fresh temp directory (keep the TempDir alive)
    pub fn temp_store() -> (TempDir, DataStore) {
        let dir = TempDir::new().expect("temp dir");
        let config = StorageConfig {
            data_dir: dir.path().join("data"),
            seed_dir: None,
        };
        let store = DataStore::open(&config).expect("open store");
        (dir, store)
    }

    pub fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Jean Dupont".to_string(),
            email: email.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            password_hash: "pbkdf2-sha256$1$AAAA$AAAA".to_string(),
            medical_id: None,
        }
    }
}
