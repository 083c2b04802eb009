//! Versioned tables and the range read pipeline.

use crate::access::{column_names, slice_rows, RecordBatch};
use crate::expression::{Clause, QueryBuilder};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::eval::apply_query;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

/// Selects one version of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsOf {
    Version(u64),
    /// Latest version written at or before this instant
    Timestamp(SystemTime),
    /// Version pinned under a snapshot label
    Snapshot(String),
}

impl fmt::Display for AsOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsOf::Version(v) => write!(f, "version {}", v),
            AsOf::Timestamp(t) => write!(f, "timestamp {:?}", t),
            AsOf::Snapshot(label) => write!(f, "snapshot '{}'", label),
        }
    }
}

/// Parameters of one range read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    pub as_of: Option<AsOf>,
    /// Columns to return, in any order; `None` returns every column
    pub columns: Option<Vec<String>>,
    pub query: Option<QueryBuilder>,
    /// Unfiltered row range `[start, end)`
    pub row_range: Option<(usize, usize)>,
}

impl ReadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_as_of(mut self, as_of: Option<AsOf>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_query(mut self, query: Option<QueryBuilder>) -> Self {
        self.query = query;
        self
    }

    pub fn with_row_range(mut self, start: usize, end: usize) -> Self {
        self.row_range = Some((start, end));
        self
    }
}

/// Result of a read
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedItem {
    pub version: u64,
    pub data: RecordBatch,
    /// Underlying rows the range covered before filtering
    pub scanned_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableVersion {
    pub version: u64,
    pub written_at: SystemTime,
    #[serde(with = "crate::access::ipc")]
    pub data: RecordBatch,
}

/// Append-only list of table versions plus snapshot labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedTable {
    name: String,
    versions: Vec<TableVersion>,
    labels: HashMap<String, u64>,
}

impl VersionedTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            labels: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &[TableVersion] {
        &self.versions
    }

    pub fn latest_version(&self) -> Option<u64> {
        self.versions.last().map(|v| v.version)
    }

    /// Append a new version and return its id
    pub fn write(&mut self, data: RecordBatch) -> u64 {
        self.write_at(data, SystemTime::now())
    }

    pub(crate) fn write_at(&mut self, data: RecordBatch, written_at: SystemTime) -> u64 {
        let version = self.latest_version().map_or(0, |v| v + 1);
        self.versions.push(TableVersion {
            version,
            written_at,
            data,
        });
        version
    }

    /// Pin `version` under `label`, replacing an earlier pin
    pub fn tag(&mut self, label: impl Into<String>, version: u64) -> StorageResult<()> {
        if !self.versions.iter().any(|v| v.version == version) {
            return Err(self.version_not_found(&AsOf::Version(version)));
        }
        self.labels.insert(label.into(), version);
        Ok(())
    }

    /// Resolve a selector; `None` picks the latest version
    pub fn resolve(&self, as_of: Option<&AsOf>) -> StorageResult<&TableVersion> {
        let found = match as_of {
            None => self.versions.last(),
            Some(AsOf::Version(version)) => self.versions.iter().find(|v| v.version == *version),
            Some(AsOf::Timestamp(at)) => self.versions.iter().rev().find(|v| v.written_at <= *at),
            Some(AsOf::Snapshot(label)) => self
                .labels
                .get(label)
                .and_then(|version| self.versions.iter().find(|v| v.version == *version)),
        };
        found.ok_or_else(|| match as_of {
            Some(selector) => self.version_not_found(selector),
            None => StorageError::VersionNotFound {
                table: self.name.clone(),
                selector: "latest".to_string(),
            },
        })
    }

    /// Unfiltered length of the selected version
    pub fn row_count(&self, as_of: Option<&AsOf>) -> StorageResult<usize> {
        Ok(self.resolve(as_of)?.data.num_rows())
    }

    /// Slice the unfiltered range, apply the query, then prune columns
    pub fn read(&self, request: &ReadRequest) -> StorageResult<VersionedItem> {
        let entry = self.resolve(request.as_of.as_ref())?;
        let total = entry.data.num_rows();
        let (start, end) = request.row_range.unwrap_or((0, total));
        let start = start.min(total);
        let end = end.clamp(start, total);

        let projected: Vec<&str> = request
            .query
            .iter()
            .flat_map(|q| q.clauses())
            .filter_map(|clause| match clause {
                Clause::Project { name, .. } => Some(name.as_str()),
                Clause::Filter(_) => None,
            })
            .collect();

        if let Some(columns) = &request.columns {
            let schema = entry.data.schema();
            if let Some(missing) = columns.iter().find(|c| {
                schema.column_with_name(c).is_none() && !projected.contains(&c.as_str())
            })
            {
                return Err(StorageError::UnknownColumn(missing.clone()));
            }
        }

        let mut data = slice_rows(&entry.data, start, end);
        if let Some(query) = &request.query {
            data = apply_query(data, query)?;
        }

        if let Some(columns) = &request.columns {
            let keep: Vec<usize> = column_names(&data.schema())
                .into_iter()
                .enumerate()
                .filter(|(_, name)| {
                    columns.iter().any(|c| c.as_str() == *name) || projected.contains(name)
                })
                .map(|(index, _)| index)
                .collect();
            data = data.project(&keep)?;
        }

        trace!(
            "Read {} rows [{}, {}) of {} v{} -> {} rows",
            end - start,
            start,
            end,
            self.name,
            entry.version,
            data.num_rows()
        );

        Ok(VersionedItem {
            version: entry.version,
            data,
            scanned_rows: end - start,
        })
    }

    fn version_not_found(&self, selector: &AsOf) -> StorageError {
        StorageError::VersionNotFound {
            table: self.name.clone(),
            selector: selector.to_string(),
        }
    }
}
