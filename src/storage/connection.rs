use crate::storage::error::{StorageError, StorageResult};
use crate::storage::file::FileBackend;
use crate::storage::memory::MemoryBackend;
use crate::storage::store::VersionedStore;
use log::debug;
use std::sync::Arc;

const MEMORY_SCHEME: &str = "mem://";
const FILE_SCHEME: &str = "file://";

enum Backend {
    Memory(Arc<MemoryBackend>),
    File(FileBackend),
}

/// Handle on a storage backend addressed by URI.
///
/// `mem://<name>` connects to the process-wide in-memory backend called
/// `name`; `file://<dir>` to collections stored under `dir`.
pub struct Connection {
    uri: String,
    backend: Backend,
}

impl Connection {
    pub fn open(uri: &str) -> StorageResult<Self> {
        let backend = if let Some(name) = uri.strip_prefix(MEMORY_SCHEME) {
            if name.is_empty() {
                return Err(invalid_uri(uri, "missing backend name"));
            }
            Backend::Memory(MemoryBackend::shared(name))
        } else if let Some(dir) = uri.strip_prefix(FILE_SCHEME) {
            if dir.is_empty() {
                return Err(invalid_uri(uri, "missing directory"));
            }
            Backend::File(FileBackend::open(dir)?)
        } else {
            return Err(invalid_uri(uri, "expected mem:// or file://"));
        };
        debug!("Opened connection to {}", uri);
        Ok(Self {
            uri: uri.to_string(),
            backend,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn create_collection(&self, name: &str) -> StorageResult<Arc<dyn VersionedStore>> {
        let collection: Arc<dyn VersionedStore> = match &self.backend {
            Backend::Memory(backend) => backend.create_collection(name)?,
            Backend::File(backend) => Arc::new(backend.create_collection(name)?),
        };
        Ok(collection)
    }

    pub fn get_collection(&self, name: &str) -> StorageResult<Arc<dyn VersionedStore>> {
        let collection: Arc<dyn VersionedStore> = match &self.backend {
            Backend::Memory(backend) => backend.get_collection(name)?,
            Backend::File(backend) => Arc::new(backend.get_collection(name)?),
        };
        Ok(collection)
    }

    /// Existing collection, or a new one
    pub fn get_or_create_collection(&self, name: &str) -> StorageResult<Arc<dyn VersionedStore>> {
        match self.get_collection(name) {
            Err(StorageError::CollectionNotFound(_)) => self.create_collection(name),
            other => other,
        }
    }

    pub fn delete_collection(&self, name: &str) -> StorageResult<()> {
        match &self.backend {
            Backend::Memory(backend) => backend.delete_collection(name),
            Backend::File(backend) => backend.delete_collection(name),
        }
    }

    pub fn list_collections(&self) -> StorageResult<Vec<String>> {
        match &self.backend {
            Backend::Memory(backend) => Ok(backend.list_collections()),
            Backend::File(backend) => backend.list_collections(),
        }
    }
}

fn invalid_uri(uri: &str, reason: &str) -> StorageError {
    StorageError::InvalidUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_invalid_uris() {
        for uri in ["", "mem://", "file://", "s3://bucket", "lmdb:///tmp/x"] {
            assert!(
                matches!(Connection::open(uri), Err(StorageError::InvalidUri { .. })),
                "{}",
                uri
            );
        }
    }

    #[test]
    fn test_memory_connections_share_state() -> Result<()> {
        let first = Connection::open("mem://connection-test")?;
        first.create_collection("c")?;
        let second = Connection::open("mem://connection-test")?;
        assert_eq!(second.list_collections()?, vec!["c".to_string()]);
        assert!(second.get_or_create_collection("c").is_ok());
        second.delete_collection("c")?;
        assert!(first.list_collections()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_file_connection() -> Result<()> {
        let dir = tempdir()?;
        let uri = format!("file://{}", dir.path().display());
        let conn = Connection::open(&uri)?;
        let collection = conn.get_or_create_collection("c")?;
        assert_eq!(collection.name(), "c");
        assert_eq!(conn.list_collections()?, vec!["c".to_string()]);
        Ok(())
    }
}
