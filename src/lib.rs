//! MiniSQL - A minimal single-node SQL engine
//!
//! The pipeline runs text → lexer → parser → semantic analyzer →
//! executor over a page-based storage engine with an LRU buffer cache.
//! State is owned by a [`Database`] value per connection and optionally
//! persisted to a single backing file.
//!
//! # Example
//!
//! ```
//! use minisql::Database;
//!
//! let mut db = Database::in_memory();
//! db.execute("CREATE TABLE student(id INT, name VARCHAR);").unwrap();
//! db.execute("INSERT INTO student VALUES (1, 'Alice');").unwrap();
//! let result = db.execute("SELECT * FROM student;").unwrap();
//! assert_eq!(result.row_count(), 1);
//! ```

pub mod catalog;
pub mod database;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use database::{Database, TableInfo};
pub use error::{Error, Result};
pub use executor::ExecutionResult;
pub use storage::{StorageStats, Value};
