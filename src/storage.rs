//! Versioned columnar storage.
//!
//! The store side of predicate pushdown. Key components:
//!
//! - **VersionedTable**: append-only table versions, `AsOf` resolution and the
//!   range read pipeline (slice, evaluate query clauses, prune columns)
//! - **ExpressionEvaluator**: evaluates `ExpressionNode` trees over a batch
//! - **VersionedStore**: the read/write contract a collection implements
//! - **Connection**: opens `mem://` or `file://` backends and their collections

pub mod connection;
pub mod error;
pub mod eval;
pub mod file;
pub mod memory;
pub mod store;
pub mod table;

pub use connection::Connection;
pub use error::{StorageError, StorageResult};
pub use eval::{apply_query, ExpressionEvaluator};
pub use file::{FileBackend, FileCollection};
pub use memory::{MemoryBackend, MemoryCollection};
pub use store::VersionedStore;
pub use table::{AsOf, ReadRequest, TableVersion, VersionedItem, VersionedTable};
