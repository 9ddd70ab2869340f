//! # redb-backed State Storage
//!
//! Persists the envelope documents in one `redb` table:
//!
//! ```text
//! crm: &str -> &str   (crm_sales, crm_leads, ..., crm_sequence)
//! ```
//!
//! A full save writes every key inside a single write transaction, so a
//! crash never leaves a mix of old and new collections on disk.

use super::StateStore;
use crate::formats::persistence::{decode_state, encode_state};
use crate::store::CrmState;
use crate::types::FunnelError;
use redb::{Database, ReadableDatabase, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for documents: key string -> envelope JSON
const CRM: TableDefinition<&str, &str> = TableDefinition::new("crm");

/// A disk-backed state store using redb.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FunnelError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| FunnelError::IoError(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| FunnelError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(CRM)
                .map_err(|e| FunnelError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| FunnelError::IoError(e.to_string()))?;
        }

        tracing::debug!(path = %path.as_ref().display(), "opened redb store");
        Ok(Self {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for RedbStore {
    fn load(&self) -> Result<CrmState, FunnelError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| FunnelError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(CRM)
            .map_err(|e| FunnelError::IoError(e.to_string()))?;

        decode_state(|key| {
            Ok(table
                .get(key)
                .map_err(|e| FunnelError::IoError(e.to_string()))?
                .map(|guard| guard.value().to_string()))
        })
    }

    fn save(&mut self, state: &CrmState) -> Result<(), FunnelError> {
        let documents = encode_state(state)?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| FunnelError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(CRM)
                .map_err(|e| FunnelError::IoError(e.to_string()))?;
            for (key, document) in &documents {
                table
                    .insert(*key, document.as_str())
                    .map_err(|e| FunnelError::IoError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| FunnelError::IoError(e.to_string()))?;

        tracing::debug!(documents = documents.len(), "saved state");
        Ok(())
    }
}
