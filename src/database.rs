//! Connection facade for MiniSQL
//!
//! A Database owns the catalog and the storage engine for one
//! connection and threads them through the statement pipeline:
//! lexer → parser → analyzer → executor. With a backing file attached,
//! state is loaded at open and flushed at checkpoint/close.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catalog::{Catalog, Column, DataType};
use crate::error::{Error, Result};
use crate::executor::{ExecutionResult, Executor};
use crate::sql::{Analyzer, Lexer, Parser};
use crate::storage::{DatabaseImage, DiskManager, StorageEngine, StorageStats, DEFAULT_CACHE_CAPACITY};

/// Introspection snapshot for one table
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<(String, DataType)>,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    pub row_count: u64,
}

pub struct Database {
    catalog: Catalog,
    storage: StorageEngine,
    disk: Option<DiskManager>,
}

impl Database {
    /// A database with no backing file; state lives for the connection.
    pub fn in_memory() -> Self {
        Database {
            catalog: Catalog::new(),
            storage: StorageEngine::new(),
            disk: None,
        }
    }

    /// Open a database backed by `path`, loading existing state when
    /// the file is present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let disk = DiskManager::new(path.as_ref());
        if !disk.exists() {
            info!(path = %path.as_ref().display(), "creating new database");
            return Ok(Database {
                catalog: Catalog::new(),
                storage: StorageEngine::new(),
                disk: Some(disk),
            });
        }
        let image = disk.load()?;
        info!(
            path = %path.as_ref().display(),
            tables = image.catalog.len(),
            pages = image.pages.len(),
            "opened database"
        );
        Ok(Database {
            catalog: image.catalog,
            storage: StorageEngine::from_image(
                image.pages,
                image.free_pages,
                image.next_page_id,
                DEFAULT_CACHE_CAPACITY,
            ),
            disk: Some(disk),
        })
    }

    /// Run exactly one `;`-terminated statement.
    pub fn execute(&mut self, sql: &str) -> Result<ExecutionResult> {
        let tokens = Lexer::new(sql).tokenize()?;
        let mut parser = Parser::new(tokens);
        let statement = parser.parse()?;
        if !parser.at_end() {
            return Err(Error::Unsupported {
                construct: "multiple statements in a single execute call".to_string(),
                line: 0,
                column: 0,
            });
        }
        let bound = Analyzer::new(&self.catalog).analyze(&statement)?;
        Executor::new(&mut self.catalog, &mut self.storage).execute(bound)
    }

    /// Run a batch of statements, one result per statement. A statement
    /// that fails at any stage is reported in place; the rest of the
    /// batch still runs (syntax errors resynchronize at the next `;`).
    /// The outer error covers input that cannot be lexed at all.
    pub fn execute_script(&mut self, sql: &str) -> Result<Vec<Result<ExecutionResult>>> {
        let tokens = Lexer::new(sql).tokenize()?;
        let statements = Parser::new(tokens).parse_batch();
        let mut results = Vec::with_capacity(statements.len());
        for parsed in statements {
            results.push(parsed.and_then(|statement| {
                let bound = Analyzer::new(&self.catalog).analyze(&statement)?;
                Executor::new(&mut self.catalog, &mut self.storage).execute(bound)
            }));
        }
        Ok(results)
    }

    /// Drop a table: the symmetric counterpart of CREATE TABLE. Frees
    /// every page the table owned.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let schema = self.catalog.drop_table(name)?;
        for &page_id in schema.pages() {
            self.storage.free_page(page_id)?;
        }
        Ok(())
    }

    /// Table names in creation order.
    pub fn table_names(&self) -> Vec<String> {
        self.catalog.table_names()
    }

    pub fn table_info(&self, name: &str) -> Option<TableInfo> {
        let schema = self.catalog.table(name)?;
        Some(TableInfo {
            name: schema.name().to_string(),
            columns: schema
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.data_type))
                .collect(),
            created_at: schema.created_at(),
            page_count: schema.page_count(),
            row_count: schema.row_count(),
        })
    }

    /// Read-only storage counters: cache hits/misses, total and free pages.
    pub fn stats(&self) -> StorageStats {
        self.storage.stats()
    }

    /// Flush catalog and pages to the backing file, if any.
    pub fn checkpoint(&mut self) -> Result<()> {
        let Some(disk) = &self.disk else {
            return Ok(());
        };
        let image = DatabaseImage {
            catalog: self.catalog.clone(),
            pages: self.storage.flush(),
            free_pages: self.storage.free_list().to_vec(),
            next_page_id: self.storage.next_page_id(),
        };
        disk.save(&image)?;
        info!(pages = image.pages.len(), "checkpoint complete");
        Ok(())
    }

    /// Disconnect: checkpoint and drop the connection state.
    pub fn close(mut self) -> Result<()> {
        self.checkpoint()
    }
}
