//! Storage layer error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid connection URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Table not found: {collection}/{table}")]
    TableNotFound { collection: String, table: String },

    #[error("Version not found for table {table}: {selector}")]
    VersionNotFound { table: String, selector: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Corrupt table file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
