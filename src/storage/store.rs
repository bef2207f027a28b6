// MessengerStore - Persistent key-value storage using sled
//
// Holds:
// - Labelled account keypairs
// - The registry snapshot (ledger, vault, nonces)

use crate::identity::Keypair;
use crate::registry::{RegistryError, RegistrySnapshot};
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const KEYPAIR_PREFIX: &[u8] = b"identity:keypair:";
    pub const SNAPSHOT: &[u8] = b"registry:snapshot";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    pub key_count: usize,
    pub disk_size_bytes: u64,
}

/// Persistent store for a messenger node
pub struct MessengerStore {
    db: sled::Db,
}

impl MessengerStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        }
    }

    // ========================================================================
    // KEYPAIRS
    // ========================================================================

    pub fn save_keypair_with_label(&self, keypair: &Keypair, label: &str) -> Result<(), StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.db.insert(key, keypair.to_bytes())?;
        Ok(())
    }

    pub fn load_keypair_with_label(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.db.get(key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Labels of all stored keypairs, sorted
    pub fn list_labels(&self) -> Result<Vec<String>, StoreError> {
        let mut labels = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, _) = result?;
            let label = &key[keys::KEYPAIR_PREFIX.len()..];
            labels.push(String::from_utf8_lossy(label).into_owned());
        }
        Ok(labels)
    }

    // ========================================================================
    // REGISTRY SNAPSHOT
    // ========================================================================

    pub fn save_snapshot(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let bytes = snapshot
            .to_bytes()
            .map_err(|e: RegistryError| StoreError::SerializationFailed(e.to_string()))?;
        self.db.insert(keys::SNAPSHOT, bytes)?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Option<RegistrySnapshot>, StoreError> {
        match self.db.get(keys::SNAPSHOT)? {
            Some(bytes) => {
                let snapshot = RegistrySnapshot::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}
