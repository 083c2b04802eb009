//! Expression translation into the storage engine's query tree.
//!
//! This module provides:
//! - Opcodes and the immutable operation tree (`ExpressionNode`)
//! - The query target contract and the engine's `QueryBuilder`
//! - The translator from client expression text to a query

pub mod error;
pub mod node;
pub mod operator;
pub mod query;
pub mod translate;

pub use error::{TranslateError, TranslateResult};
pub use node::{col, ExpressionNode};
pub use operator::Opcode;
pub use query::{Clause, QueryBuilder, QueryTarget};
pub use translate::{translate, Translator};
