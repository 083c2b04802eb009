//! Directory-backed collections.
//!
//! Layout: `<root>/<collection>/<table>.tbl`. Each table file is
//!
//! ```text
//! +-------+----------------+----------------+------------------------------+
//! | PDTB  | format (u32le) | length (u64le) | bincode(VersionedTable)      |
//! +-------+----------------+----------------+------------------------------+
//! ```
//!
//! Version data inside the bincode payload is an arrow IPC stream.
//!
//! Writes go to `<table>.tbl.tmp` and are renamed over the old file.

use crate::access::RecordBatch;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::VersionedStore;
use crate::storage::table::{AsOf, ReadRequest, VersionedItem, VersionedTable};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"PDTB";
const FORMAT_VERSION: u32 = 1;
const TABLE_EXTENSION: &str = "tbl";

/// Root directory holding one subdirectory per collection
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_collection(&self, name: &str) -> StorageResult<FileCollection> {
        let dir = self.collection_dir(name)?;
        if dir.exists() {
            return Err(StorageError::CollectionExists(name.to_string()));
        }
        fs::create_dir_all(&dir)?;
        debug!("Created collection directory {:?}", dir);
        Ok(FileCollection::new(name, dir))
    }

    pub fn get_collection(&self, name: &str) -> StorageResult<FileCollection> {
        let dir = self.collection_dir(name)?;
        if !dir.is_dir() {
            return Err(StorageError::CollectionNotFound(name.to_string()));
        }
        Ok(FileCollection::new(name, dir))
    }

    pub fn delete_collection(&self, name: &str) -> StorageResult<()> {
        let dir = self.collection_dir(name)?;
        if !dir.is_dir() {
            return Err(StorageError::CollectionNotFound(name.to_string()));
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    pub fn list_collections(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn collection_dir(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Collection whose tables live in one file each
pub struct FileCollection {
    name: String,
    dir: PathBuf,
    // Serializes read-modify-write cycles on table files
    write_lock: Mutex<()>,
}

impl FileCollection {
    fn new(name: &str, dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            dir,
            write_lock: Mutex::new(()),
        }
    }

    fn table_path(&self, table: &str) -> StorageResult<PathBuf> {
        validate_name(table)?;
        Ok(self.dir.join(format!("{}.{}", table, TABLE_EXTENSION)))
    }

    fn load(&self, table: &str) -> StorageResult<VersionedTable> {
        let path = self.table_path(table)?;
        if !path.is_file() {
            return Err(StorageError::TableNotFound {
                collection: self.name.clone(),
                table: table.to_string(),
            });
        }
        read_table_file(&path)
    }

    fn store(&self, table: &VersionedTable) -> StorageResult<()> {
        let path = self.table_path(table.name())?;
        write_table_file(&path, table)
    }
}

impl VersionedStore for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, table: &str, request: &ReadRequest) -> StorageResult<VersionedItem> {
        self.load(table)?.read(request)
    }

    fn row_count(&self, table: &str, as_of: Option<&AsOf>) -> StorageResult<usize> {
        self.load(table)?.row_count(as_of)
    }

    fn write(&self, table: &str, data: RecordBatch) -> StorageResult<u64> {
        let _guard = self.write_lock.lock();
        let mut entry = match self.load(table) {
            Ok(entry) => entry,
            Err(StorageError::TableNotFound { .. }) => VersionedTable::new(table),
            Err(e) => return Err(e),
        };
        let version = entry.write(data);
        self.store(&entry)?;
        debug!("Wrote {}/{} version {}", self.name, table, version);
        Ok(version)
    }

    fn tag_version(&self, table: &str, label: &str, version: u64) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let mut entry = self.load(table)?;
        entry.tag(label, version)?;
        self.store(&entry)
    }

    fn has_table(&self, table: &str) -> StorageResult<bool> {
        Ok(self.table_path(table)?.is_file())
    }

    fn delete_table(&self, table: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let path = self.table_path(table)?;
        if !path.is_file() {
            return Err(StorageError::TableNotFound {
                collection: self.name.clone(),
                table: table.to_string(),
            });
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn list_tables(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidUri {
            uri: name.to_string(),
            reason: "not a valid collection or table name".to_string(),
        })
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> StorageError {
    StorageError::Corrupt {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn read_table_file(path: &Path) -> StorageResult<VersionedTable> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(corrupt(path, "bad magic"));
    }

    let format = reader.read_u32::<LittleEndian>()?;
    if format != FORMAT_VERSION {
        return Err(corrupt(path, format!("unsupported format version {}", format)));
    }

    let length = reader.read_u64::<LittleEndian>()?;
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    if payload.len() as u64 != length {
        return Err(corrupt(
            path,
            format!("payload is {} bytes, header says {}", payload.len(), length),
        ));
    }

    Ok(bincode::deserialize(&payload)?)
}

pub(crate) fn write_table_file(path: &Path, table: &VersionedTable) -> StorageResult<()> {
    let payload = bincode::serialize(table)?;
    let tmp = path.with_extension(format!("{}.tmp", TABLE_EXTENSION));
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        writer.write_all(MAGIC)?;
        writer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        writer.write_u64::<LittleEndian>(payload.len() as u64)?;
        writer.write_all(&payload)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{batch_from_rows, schema_of, DataType, Value};
    use anyhow::Result;
    use tempfile::tempdir;

    fn batch(n: i64) -> RecordBatch {
        let schema = schema_of(&[("x", DataType::Int64)]);
        let rows: Vec<Vec<Value>> = (0..n).map(|i| vec![Value::Int64(i)]).collect();
        batch_from_rows(schema, &rows).unwrap()
    }

    #[test]
    fn test_table_file_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.tbl");
        let mut table = VersionedTable::new("t");
        table.write(batch(3));
        table.tag("snap", 0)?;

        write_table_file(&path, &table)?;
        assert_eq!(read_table_file(&path)?, table);
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.tbl");
        fs::write(&path, b"NOPE0000")?;
        assert!(matches!(
            read_table_file(&path),
            Err(StorageError::Corrupt { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_collection_persists_across_handles() -> Result<()> {
        let dir = tempdir()?;
        let backend = FileBackend::open(dir.path())?;
        let collection = backend.create_collection("c")?;
        assert_eq!(collection.write("t", batch(5))?, 0);
        assert_eq!(collection.write("t", batch(7))?, 1);

        let reopened = FileBackend::open(dir.path())?.get_collection("c")?;
        assert_eq!(reopened.row_count("t", None)?, 7);
        assert_eq!(reopened.row_count("t", Some(&AsOf::Version(0)))?, 5);
        assert_eq!(reopened.list_tables()?, vec!["t".to_string()]);
        assert_eq!(backend.list_collections()?, vec!["c".to_string()]);
        Ok(())
    }

    #[test]
    fn test_invalid_names() -> Result<()> {
        let dir = tempdir()?;
        let backend = FileBackend::open(dir.path())?;
        assert!(backend.create_collection("../escape").is_err());
        assert!(matches!(
            backend.get_collection("missing"),
            Err(StorageError::CollectionNotFound(_))
        ));
        Ok(())
    }
}
