// Scan module - lazy paginated reads with predicate pushdown and column pruning

pub mod error;
pub mod handle;
pub mod source;

pub use error::{ScanError, ScanResult};
pub use handle::{open_scan, parse_schema, TableHandle};
pub use source::{BatchStream, ScanOptions, ScanSource};
