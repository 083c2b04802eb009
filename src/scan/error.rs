//! Scan error types.

use crate::expression::TranslateError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while opening or pulling a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Predicate translation failed: {0}")]
    Translate(#[from] TranslateError),

    #[error("Upstream read failed: {0}")]
    UpstreamRead(#[from] StorageError),

    #[error("Invalid scan options: {0}")]
    InvalidOptions(String),

    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { table: String, column: String },
}

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;
