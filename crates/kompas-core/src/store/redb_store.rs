//! # redb-backed Document Storage
//!
//! A disk-backed key-value store using the redb embedded database,
//! providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - Zero configuration
//!
//! One table maps document keys to JSON strings. Each write is its
//! own transaction: stage saves are infrequent (user-paced), so fsync
//! overhead is irrelevant here.

use super::KeyValueStore;
use crate::KompasError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for documents: key string -> JSON string.
const DOCUMENTS: TableDefinition<&str, &str> = TableDefinition::new("documents");

/// A disk-backed document store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a document database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KompasError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| KompasError::StorageError(e.to_string()))?;

        // Initialize the table if it doesn't exist.
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
            let _ = write_txn
                .open_table(DOCUMENTS)
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), KompasError> {
        self.db
            .compact()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, KompasError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(DOCUMENTS)
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| KompasError::StorageError(e.to_string()))?
            .map(|v| v.value().to_string());
        Ok(value)
    }

    fn put_raw(&mut self, key: &str, json: &str) -> Result<(), KompasError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
            table
                .insert(key, json)
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KompasError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| KompasError::StorageError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, KompasError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KompasError::StorageError(e.to_string()))?;
        let table = read_txn
            .open_table(DOCUMENTS)
            .map_err(|e| KompasError::StorageError(e.to_string()))?;

        let mut keys = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| KompasError::StorageError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| KompasError::StorageError(e.to_string()))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redb_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docs.redb");

        let mut store = RedbStore::open(&path).expect("open");
        store.put_raw("revenueData", r#"{"x":1}"#).expect("put");

        assert_eq!(
            store.get_raw("revenueData").expect("get"),
            Some(r#"{"x":1}"#.to_string())
        );
        assert_eq!(store.get_raw("missing").expect("get"), None);
    }

    #[test]
    fn redb_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docs.redb");

        {
            let mut store = RedbStore::open(&path).expect("open");
            store.put_raw("k", "1").expect("put");
        }

        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.get_raw("k").expect("get"), Some("1".to_string()));
    }

    #[test]
    fn redb_remove_and_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docs.redb");

        let mut store = RedbStore::open(&path).expect("open");
        store.put_raw("b", "{}").expect("put");
        store.put_raw("a", "{}").expect("put");
        assert_eq!(store.keys().expect("keys"), vec!["a", "b"]);

        store.remove("a").expect("remove");
        assert_eq!(store.keys().expect("keys"), vec!["b"]);
    }
}
