//! Data representations shared by the translator, the store and the scan.
//!
//! - **Value / DataType**: scalar values and the logical column types
//! - **batch**: scalar access to arrow `RecordBatch` columns and the batch
//!   edits used by the read pipeline
//! - **ipc**: arrow IPC encoding of persisted batches

pub mod batch;
pub mod ipc;
pub mod value;

pub use arrow::datatypes::{Field, Schema, SchemaRef};
pub use arrow::record_batch::RecordBatch;
pub use batch::{
    array_from_values, batch_from_rows, batch_rows, column_names, column_values, field,
    schema_of, slice_rows, value_at, with_column, BatchResult,
};
pub use value::{DataType, Value};
