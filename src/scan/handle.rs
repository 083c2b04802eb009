//! Table handles: one table of one collection, pinned to one version.

use crate::access::{column_names, SchemaRef};
use crate::config::ScanConfig;
use crate::scan::error::ScanResult;
use crate::scan::source::ScanSource;
use crate::storage::{AsOf, Connection, ReadRequest, VersionedStore};
use log::debug;
use std::sync::Arc;

/// Open `table` of `collection` at `uri` and read its schema
pub fn open_scan(
    uri: &str,
    collection: &str,
    table: &str,
    as_of: Option<AsOf>,
) -> ScanResult<TableHandle> {
    let connection = Connection::open(uri)?;
    let store = connection.get_collection(collection)?;
    TableHandle::from_store(store, table, as_of)
}

/// Schema of the selected version, read through a zero-row probe
pub fn parse_schema(
    store: &dyn VersionedStore,
    table: &str,
    as_of: Option<&AsOf>,
) -> ScanResult<SchemaRef> {
    read_schema(store, table, as_of).map(|(schema, _)| schema)
}

/// Zero-row read of the selected version: its schema and resolved version id
fn read_schema(
    store: &dyn VersionedStore,
    table: &str,
    as_of: Option<&AsOf>,
) -> ScanResult<(SchemaRef, u64)> {
    let request = ReadRequest::new()
        .with_as_of(as_of.cloned())
        .with_row_range(0, 0);
    let item = store.read(table, &request)?;
    Ok((item.data.schema(), item.version))
}

/// A table bound to one version with its schema known in advance
#[derive(Clone)]
pub struct TableHandle {
    store: Arc<dyn VersionedStore>,
    table: String,
    as_of: AsOf,
    version: u64,
    schema: SchemaRef,
}

impl TableHandle {
    /// Probe `table` once; without a selector the handle pins the latest version
    pub fn from_store(
        store: Arc<dyn VersionedStore>,
        table: &str,
        as_of: Option<AsOf>,
    ) -> ScanResult<Self> {
        let (schema, version) = read_schema(store.as_ref(), table, as_of.as_ref())?;
        debug!(
            "Opened {}/{} at version {} with columns {:?}",
            store.name(),
            table,
            version,
            column_names(&schema)
        );
        Ok(Self {
            schema,
            as_of: as_of.unwrap_or(AsOf::Version(version)),
            store,
            table: table.to_string(),
            version,
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn as_of(&self) -> &AsOf {
        &self.as_of
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn store(&self) -> &Arc<dyn VersionedStore> {
        &self.store
    }

    /// Lazy batch factory with default settings
    pub fn scan(&self) -> ScanSource {
        ScanSource::new(self.clone())
    }

    /// Lazy batch factory with explicit settings
    pub fn scan_with(&self, config: ScanConfig) -> ScanSource {
        ScanSource::new(self.clone()).with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{batch_from_rows, schema_of, DataType, Value};
    use crate::scan::error::ScanError;
    use crate::storage::{MemoryCollection, StorageError};
    use anyhow::Result;

    fn store() -> Arc<dyn VersionedStore> {
        let collection = MemoryCollection::new("c");
        let schema = schema_of(&[("a", DataType::Int64), ("s", DataType::Utf8)]);
        let batch = batch_from_rows(schema, &[vec![Value::Int64(1), Value::from("x")]]).unwrap();
        collection.write("t", batch.clone()).unwrap();
        collection
            .write("t", batch.project(&[0]).unwrap().slice(0, 0))
            .unwrap();
        Arc::new(collection)
    }

    #[test]
    fn test_parse_schema() -> Result<()> {
        let store = store();
        let schema = parse_schema(store.as_ref(), "t", None)?;
        assert_eq!(column_names(&schema), vec!["a"]);
        let schema = parse_schema(store.as_ref(), "t", Some(&AsOf::Version(0)))?;
        assert_eq!(column_names(&schema), vec!["a", "s"]);
        Ok(())
    }

    #[test]
    fn test_handle_and_parse_schema_agree() -> Result<()> {
        let store = store();
        for as_of in [None, Some(AsOf::Version(0)), Some(AsOf::Version(1))] {
            let handle = TableHandle::from_store(store.clone(), "t", as_of.clone())?;
            let schema = parse_schema(store.as_ref(), "t", as_of.as_ref())?;
            assert_eq!(handle.schema(), &schema, "{:?}", as_of);
        }
        Ok(())
    }

    #[test]
    fn test_handle_pins_latest_version() -> Result<()> {
        let handle = TableHandle::from_store(store(), "t", None)?;
        assert_eq!(handle.version(), 1);
        assert_eq!(handle.as_of(), &AsOf::Version(1));
        assert_eq!(handle.schema().fields().len(), 1);

        let handle = TableHandle::from_store(store(), "t", Some(AsOf::Version(0)))?;
        assert_eq!(handle.version(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_table_surfaces_upstream_error() {
        let result = TableHandle::from_store(store(), "nope", None);
        assert!(matches!(
            result,
            Err(ScanError::UpstreamRead(StorageError::TableNotFound { .. }))
        ));
    }
}
