// In-memory collections, shared process-wide by backend name until dropped

use crate::access::RecordBatch;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::VersionedStore;
use crate::storage::table::{AsOf, ReadRequest, VersionedItem, VersionedTable};
use dashmap::DashMap;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static BACKENDS: LazyLock<DashMap<String, Arc<MemoryBackend>>> = LazyLock::new(DashMap::new);

/// Named set of in-memory collections
#[derive(Default)]
pub struct MemoryBackend {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl MemoryBackend {
    /// The backend registered under `name`, created on first use
    pub fn shared(name: &str) -> Arc<MemoryBackend> {
        BACKENDS
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating in-memory backend '{}'", name);
                Arc::new(MemoryBackend::default())
            })
            .clone()
    }

    /// Unregister the backend `name`; open handles keep their collections.
    /// Returns false if no such backend was registered.
    pub fn drop_backend(name: &str) -> bool {
        let dropped = BACKENDS.remove(name).is_some();
        if dropped {
            debug!("Dropped in-memory backend '{}'", name);
        }
        dropped
    }

    pub fn create_collection(&self, name: &str) -> StorageResult<Arc<MemoryCollection>> {
        match self.collections.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StorageError::CollectionExists(name.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let collection = Arc::new(MemoryCollection::new(name));
                slot.insert(collection.clone());
                Ok(collection)
            }
        }
    }

    pub fn get_collection(&self, name: &str) -> StorageResult<Arc<MemoryCollection>> {
        self.collections
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::CollectionNotFound(name.to_string()))
    }

    pub fn delete_collection(&self, name: &str) -> StorageResult<()> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::CollectionNotFound(name.to_string()))
    }

    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Tables held in memory behind a read-write lock
pub struct MemoryCollection {
    name: String,
    tables: RwLock<HashMap<String, VersionedTable>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn table_not_found(&self, table: &str) -> StorageError {
        StorageError::TableNotFound {
            collection: self.name.clone(),
            table: table.to_string(),
        }
    }
}

impl VersionedStore for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, table: &str, request: &ReadRequest) -> StorageResult<VersionedItem> {
        let tables = self.tables.read();
        tables
            .get(table)
            .ok_or_else(|| self.table_not_found(table))?
            .read(request)
    }

    fn row_count(&self, table: &str, as_of: Option<&AsOf>) -> StorageResult<usize> {
        let tables = self.tables.read();
        tables
            .get(table)
            .ok_or_else(|| self.table_not_found(table))?
            .row_count(as_of)
    }

    fn write(&self, table: &str, data: RecordBatch) -> StorageResult<u64> {
        let mut tables = self.tables.write();
        let version = tables
            .entry(table.to_string())
            .or_insert_with(|| VersionedTable::new(table))
            .write(data);
        debug!("Wrote {}/{} version {}", self.name, table, version);
        Ok(version)
    }

    fn tag_version(&self, table: &str, label: &str, version: u64) -> StorageResult<()> {
        let mut tables = self.tables.write();
        match tables.get_mut(table) {
            Some(entry) => entry.tag(label, version),
            None => Err(self.table_not_found(table)),
        }
    }

    fn has_table(&self, table: &str) -> StorageResult<bool> {
        Ok(self.tables.read().contains_key(table))
    }

    fn delete_table(&self, table: &str) -> StorageResult<()> {
        self.tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| self.table_not_found(table))
    }

    fn list_tables(&self) -> StorageResult<Vec<String>> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{batch_from_rows, schema_of, DataType, Value};

    fn batch() -> RecordBatch {
        let schema = schema_of(&[("x", DataType::Int64)]);
        batch_from_rows(schema, &[vec![Value::Int64(1)], vec![Value::Int64(2)]]).unwrap()
    }

    #[test]
    fn test_shared_backend_is_reused() {
        let first = MemoryBackend::shared("memory-test-shared");
        first.create_collection("c").unwrap();
        let second = MemoryBackend::shared("memory-test-shared");
        assert_eq!(second.list_collections(), vec!["c".to_string()]);
    }

    #[test]
    fn test_drop_backend_releases_state() {
        let first = MemoryBackend::shared("memory-test-drop");
        let collection = first.create_collection("c").unwrap();
        collection.write("t", batch()).unwrap();

        assert!(MemoryBackend::drop_backend("memory-test-drop"));
        assert!(!MemoryBackend::drop_backend("memory-test-drop"));
        assert!(collection.has_table("t").unwrap());

        let fresh = MemoryBackend::shared("memory-test-drop");
        assert!(fresh.list_collections().is_empty());
        assert!(MemoryBackend::drop_backend("memory-test-drop"));
    }

    #[test]
    fn test_collection_lifecycle() {
        let backend = MemoryBackend::default();
        backend.create_collection("c").unwrap();
        assert!(matches!(
            backend.create_collection("c"),
            Err(StorageError::CollectionExists(_))
        ));
        backend.delete_collection("c").unwrap();
        assert!(matches!(
            backend.get_collection("c"),
            Err(StorageError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_write_read_tag() {
        let collection = MemoryCollection::new("c");
        assert_eq!(collection.write("t", batch()).unwrap(), 0);
        assert_eq!(collection.write("t", batch()).unwrap(), 1);
        collection.tag_version("t", "snap", 0).unwrap();
        assert_eq!(collection.row_count("t", None).unwrap(), 2);
        assert!(collection.has_table("t").unwrap());
        assert_eq!(collection.list_tables().unwrap(), vec!["t".to_string()]);

        let item = collection
            .read("t", &ReadRequest::new().with_as_of(Some(AsOf::Snapshot("snap".into()))))
            .unwrap();
        assert_eq!(item.version, 0);

        assert!(matches!(
            collection.read("missing", &ReadRequest::new()),
            Err(StorageError::TableNotFound { .. })
        ));
        collection.delete_table("t").unwrap();
        assert!(!collection.has_table("t").unwrap());
    }
}
