//! Lazy paginated scans.
//!
//! A [`ScanSource`] is a factory bound to one [`TableHandle`]. Nothing is
//! read until [`ScanSource::open`] is called with concrete options; it
//! compiles the predicate once and returns a [`BatchStream`] that performs
//! one range read per pull. The read offset walks the unfiltered row space
//! in steps of the batch size, whatever the predicate kept. Each pull yields
//! the arrow `RecordBatch` the store returned.

use crate::access::{RecordBatch, SchemaRef};
use crate::config::{EndOfTable, ScanConfig};
use crate::expression::{QueryBuilder, Translator};
use crate::scan::error::{ScanError, ScanResult};
use crate::scan::handle::TableHandle;
use crate::storage::{AsOf, ReadRequest, VersionedStore};
use log::{debug, trace};
use std::sync::Arc;

/// Per-invocation scan parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Columns to return; `None` returns every column
    pub with_columns: Option<Vec<String>>,
    /// Filter in the client engine's expression syntax
    pub predicate: Option<String>,
    /// Cap on the total number of rows returned
    pub n_rows: Option<usize>,
    /// Underlying rows per range read
    pub batch_size: Option<usize>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_n_rows(mut self, n_rows: usize) -> Self {
        self.n_rows = Some(n_rows);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Lazy batch factory for one table handle
#[derive(Clone)]
pub struct ScanSource {
    handle: TableHandle,
    config: ScanConfig,
}

impl ScanSource {
    pub fn new(handle: TableHandle) -> Self {
        Self {
            handle,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Schema known before any batch is read
    pub fn schema(&self) -> &SchemaRef {
        self.handle.schema()
    }

    /// Validate `options`, compile the predicate and return the batch stream
    pub fn open(&self, options: ScanOptions) -> ScanResult<BatchStream> {
        let batch_size = options
            .batch_size
            .unwrap_or(self.config.default_batch_size);
        if batch_size == 0 {
            return Err(ScanError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }

        if let Some(columns) = &options.with_columns {
            if columns.is_empty() {
                return Err(ScanError::InvalidOptions(
                    "column selection must name at least one column".to_string(),
                ));
            }
            let schema = self.handle.schema();
            if let Some(missing) = columns.iter().find(|c| schema.column_with_name(c).is_none()) {
                return Err(ScanError::UnknownColumn {
                    table: self.handle.table().to_string(),
                    column: missing.clone(),
                });
            }
        }

        let query = match &options.predicate {
            Some(text) => {
                let translator = Translator::with_config(self.config.translator.clone());
                let query = translator.translate(text, QueryBuilder::new())?;
                debug!("Pushing down {}", query);
                Some(query).filter(|q| !q.is_empty())
            }
            None => None,
        };

        let batch_size = match options.n_rows {
            Some(cap) if cap > 0 => batch_size.min(cap),
            _ => batch_size,
        };

        let mut stream = BatchStream {
            store: self.handle.store().clone(),
            table: self.handle.table().to_string(),
            as_of: self.handle.as_of().clone(),
            columns: options.with_columns,
            query,
            batch_size,
            remaining: options.n_rows,
            end_of_table: self.config.end_of_table,
            total_rows: None,
            offset: 0,
            done: options.n_rows == Some(0),
        };

        if !stream.done && stream.end_of_table == EndOfTable::RowCount {
            let total = stream
                .store
                .row_count(&stream.table, Some(&stream.as_of))?;
            debug!("Scanning {} rows of {}", total, stream.table);
            stream.total_rows = Some(total);
        }

        Ok(stream)
    }
}

/// Pull-based sequence of batches; one range read per pull
pub struct BatchStream {
    store: Arc<dyn VersionedStore>,
    table: String,
    as_of: AsOf,
    columns: Option<Vec<String>>,
    query: Option<QueryBuilder>,
    batch_size: usize,
    remaining: Option<usize>,
    end_of_table: EndOfTable,
    total_rows: Option<usize>,
    offset: usize,
    done: bool,
}

impl BatchStream {
    /// Effective rows per range read
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start of the next underlying range
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The compiled pushdown query, if any
    pub fn query(&self) -> Option<&QueryBuilder> {
        self.query.as_ref()
    }

    fn next_batch(&mut self) -> ScanResult<Option<RecordBatch>> {
        while !self.done {
            if let Some(total) = self.total_rows {
                if self.offset >= total {
                    self.done = true;
                    break;
                }
            }

            let start = self.offset;
            let end = start + self.batch_size;
            let request = ReadRequest::new()
                .with_as_of(Some(self.as_of.clone()))
                .with_columns(self.columns.clone())
                .with_query(self.query.clone())
                .with_row_range(start, end);
            let item = self.store.read(&self.table, &request)?;
            self.offset = end;

            let mut data = item.data;
            let returned = data.num_rows();
            trace!(
                "Range [{}, {}) of {} covered {} rows, returned {}",
                start,
                end,
                self.table,
                item.scanned_rows,
                returned
            );

            match self.remaining {
                Some(remaining) if returned >= remaining => {
                    data = data.slice(0, remaining);
                    self.remaining = Some(0);
                    self.done = true;
                }
                Some(remaining) => {
                    self.remaining = Some(remaining - returned);
                    if self.end_of_table == EndOfTable::Heuristic
                        && item.scanned_rows < self.batch_size
                    {
                        self.done = true;
                    }
                }
                None => {
                    if self.end_of_table == EndOfTable::Heuristic && returned < self.batch_size {
                        self.done = true;
                    }
                }
            }

            if data.num_rows() > 0 {
                debug!(
                    "Batch at offset {} of {}: {} rows",
                    start,
                    self.table,
                    data.num_rows()
                );
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}

impl Iterator for BatchStream {
    type Item = ScanResult<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
