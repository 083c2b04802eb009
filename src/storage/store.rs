use crate::access::RecordBatch;
use crate::storage::error::StorageResult;
use crate::storage::table::{AsOf, ReadRequest, VersionedItem};

/// A collection of versioned tables
pub trait VersionedStore: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Range read with optional version, column and query selection
    fn read(&self, table: &str, request: &ReadRequest) -> StorageResult<VersionedItem>;

    /// Unfiltered row count of the selected version
    fn row_count(&self, table: &str, as_of: Option<&AsOf>) -> StorageResult<usize>;

    /// Append a new version of `table`, creating it if needed
    fn write(&self, table: &str, data: RecordBatch) -> StorageResult<u64>;

    /// Pin `version` of `table` under `label`
    fn tag_version(&self, table: &str, label: &str, version: u64) -> StorageResult<()>;

    fn has_table(&self, table: &str) -> StorageResult<bool>;

    fn delete_table(&self, table: &str) -> StorageResult<()>;

    /// Table names, sorted
    fn list_tables(&self) -> StorageResult<Vec<String>>;
}
