//! # Key-Value Store Boundary
//!
//! The persistence boundary for the assessment pipeline: a mapping
//! from string keys to JSON documents. Stages read and write through
//! this boundary only; the core has no knowledge of how it is
//! implemented.
//!
//! Documents are opaque JSON strings to the store. No schema
//! validation happens here; validation is the stage's responsibility
//! on load, and a malformed document falls back to the stage default
//! rather than surfacing as an error.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: `BTreeMap`-backed, volatile. Used by tests and
//!   ephemeral runs.
//! - [`RedbStore`]: disk-backed ACID storage via redb.
//! - [`StoreBackend`]: enum dispatch between the two.

mod redb_store;

pub use redb_store::RedbStore;

use crate::KompasError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// STORE TRAIT
// =============================================================================

/// A persisted mapping from string keys to JSON documents.
///
/// Single-writer, single-reader per key: last write wins. There is no
/// locking requirement; concurrent multi-tab edits are out of scope.
pub trait KeyValueStore {
    /// Read the raw JSON document stored under `key`, if any.
    fn get_raw(&self, key: &str) -> Result<Option<String>, KompasError>;

    /// Write a raw JSON document under `key`, replacing any previous value.
    fn put_raw(&mut self, key: &str, json: &str) -> Result<(), KompasError>;

    /// Remove the document under `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), KompasError>;

    /// All keys currently present, in lexicographic order.
    fn keys(&self) -> Result<Vec<String>, KompasError>;
}

/// Load and deserialize the document under `key`.
///
/// Returns `Ok(None)` both when the key is absent and when the stored
/// JSON does not parse into `T`: a malformed document is recovered by
/// falling back to the caller's default, never propagated as a crash.
pub fn load_document<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, KompasError> {
    let Some(raw) = store.get_raw(key)? else {
        return Ok(None);
    };
    Ok(serde_json::from_str(&raw).ok())
}

/// Serialize `document` and store it under `key`.
pub fn save_document<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    document: &T,
) -> Result<(), KompasError> {
    let json = serde_json::to_string(document)
        .map_err(|e| KompasError::SerializationError(e.to_string()))?;
    store.put_raw(key, &json)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile in-memory store. BTreeMap for deterministic key order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, KompasError> {
        Ok(self.documents.get(key).cloned())
    }

    fn put_raw(&mut self, key: &str, json: &str) -> Result<(), KompasError> {
        self.documents.insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KompasError> {
        self.documents.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, KompasError> {
        Ok(self.documents.keys().cloned().collect())
    }
}

// =============================================================================
// BACKEND DISPATCH
// =============================================================================

/// Storage backend for a pipeline.
///
/// NOTE: does NOT implement Clone; a redb database handle cannot be
/// safely cloned.
#[derive(Debug)]
pub enum StoreBackend {
    /// In-memory documents (fast, volatile).
    Memory(MemoryStore),
    /// Disk-backed documents using redb (ACID, persistent).
    Redb(RedbStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Memory(MemoryStore::new())
    }
}

impl StoreBackend {
    /// Open or create a redb-backed store at the given path.
    pub fn open_redb(path: impl AsRef<Path>) -> Result<Self, KompasError> {
        Ok(Self::Redb(RedbStore::open(path)?))
    }

    /// Check if this backend persists across sessions.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Redb(_))
    }
}

impl KeyValueStore for StoreBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, KompasError> {
        match self {
            Self::Memory(store) => store.get_raw(key),
            Self::Redb(store) => store.get_raw(key),
        }
    }

    fn put_raw(&mut self, key: &str, json: &str) -> Result<(), KompasError> {
        match self {
            Self::Memory(store) => store.put_raw(key, json),
            Self::Redb(store) => store.put_raw(key, json),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), KompasError> {
        match self {
            Self::Memory(store) => store.remove(key),
            Self::Redb(store) => store.remove(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, KompasError> {
        match self {
            Self::Memory(store) => store.keys(),
            Self::Redb(store) => store.keys(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        value: u64,
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.put_raw("a", r#"{"value":1}"#).expect("put");

        assert_eq!(
            store.get_raw("a").expect("get"),
            Some(r#"{"value":1}"#.to_string())
        );
        assert_eq!(store.get_raw("missing").expect("get"), None);
    }

    #[test]
    fn last_write_wins() {
        let mut store = MemoryStore::new();
        store.put_raw("k", "1").expect("put");
        store.put_raw("k", "2").expect("put");
        assert_eq!(store.get_raw("k").expect("get"), Some("2".to_string()));
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let mut store = MemoryStore::new();
        store.remove("nope").expect("remove");
    }

    #[test]
    fn keys_lexicographic() {
        let mut store = MemoryStore::new();
        store.put_raw("b", "{}").expect("put");
        store.put_raw("a", "{}").expect("put");
        assert_eq!(store.keys().expect("keys"), vec!["a", "b"]);
    }

    #[test]
    fn typed_document_round_trip() {
        let mut store = MemoryStore::new();
        save_document(&mut store, "doc", &Doc { value: 42 }).expect("save");

        let loaded: Option<Doc> = load_document(&store, "doc").expect("load");
        assert_eq!(loaded, Some(Doc { value: 42 }));
    }

    #[test]
    fn malformed_document_loads_as_none() {
        let mut store = MemoryStore::new();
        store.put_raw("doc", "{not json").expect("put");

        let loaded: Option<Doc> = load_document(&store, "doc").expect("load");
        assert_eq!(loaded, None);
    }

    #[test]
    fn wrong_shape_document_loads_as_none() {
        let mut store = MemoryStore::new();
        store.put_raw("doc", r#"{"other":true}"#).expect("put");

        let loaded: Option<Doc> = load_document(&store, "doc").expect("load");
        assert_eq!(loaded, None);
    }

    #[test]
    fn backend_dispatch_memory() {
        let mut backend = StoreBackend::default();
        assert!(!backend.is_persistent());
        backend.put_raw("k", "{}").expect("put");
        assert_eq!(backend.get_raw("k").expect("get"), Some("{}".to_string()));
    }
}
