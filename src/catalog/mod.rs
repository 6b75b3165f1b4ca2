//! Catalog: table schemas and metadata

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::Catalog;
pub use schema::{Column, TableSchema};
pub use types::DataType;
