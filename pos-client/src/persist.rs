//! redb-based local snapshot cache
//!
//! The store's full snapshot is written after every mutation and
//! rehydrated at startup. This is a private per-terminal cache, not a
//! shared contract: it must tolerate being absent (first run) or from
//! a previous schema (best-effort partial load).

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::models::{MenuItem, Order, Table};

/// Single-row table holding the JSON-serialized snapshot
const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");
const STATE_KEY: &str = "state";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serialized store state
///
/// Every field defaults independently, so a snapshot written by an
/// older schema still loads the sections it has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub menu_items: Vec<MenuItem>,
    pub orders: Vec<Order>,
    pub tables: Vec<Table>,
}

/// Snapshot storage backed by redb
#[derive(Debug)]
pub struct SnapshotStore {
    db: Database,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        let db = Database::create(path)?;
        Ok(Self { db })
    }

    /// Persist the full snapshot, replacing the previous one
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec(snapshot)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SNAPSHOT_TABLE)?;
            table.insert(STATE_KEY, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Best-effort load: `None` on first run or when the stored bytes
    /// cannot be read at all; a decode failure is logged, never raised
    pub fn load(&self) -> Option<StoreSnapshot> {
        let bytes = match self.read_raw() {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!("Failed to read snapshot, starting fresh: {}", e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Snapshot did not decode, starting fresh: {}", e);
                None
            }
        }
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>, PersistError> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(SNAPSHOT_TABLE) {
            Ok(table) => table,
            // First run: the table does not exist yet
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        use redb::ReadableTable;
        Ok(table.get(STATE_KEY)?.map(|guard| guard.value().to_vec()))
    }

    /// Raw write path, used to simulate foreign-schema snapshots
    #[cfg(test)]
    fn save_raw(&self, bytes: &[u8]) -> Result<(), PersistError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SNAPSHOT_TABLE)?;
            table.insert(STATE_KEY, bytes)?;
        }
        txn.commit()?;
        Ok(())
    }
}
