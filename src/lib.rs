pub mod access;
pub mod config;
pub mod expression;
pub mod scan;
pub mod storage;
pub mod syntax;
