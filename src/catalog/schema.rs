//! Table schemas for MiniSQL
//!
//! A TableSchema carries the ordered column definitions, the creation
//! timestamp, and storage bookkeeping: the list of pages the table owns
//! and its row count. Column order is significant for positional INSERT
//! and for `SELECT *` projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::types::DataType;
use crate::storage::page::PageId;

/// A column definition: name plus declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Column {
            name: name.into(),
            data_type,
        }
    }
}

/// Schema and storage metadata for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    created_at: DateTime<Utc>,
    pages: Vec<PageId>,
    row_count: u64,
}

impl TableSchema {
    /// Column uniqueness is the analyzer's responsibility; the schema
    /// stores whatever it is given.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        TableSchema {
            name: name.into(),
            columns,
            created_at: Utc::now(),
            pages: Vec::new(),
            row_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn pages(&self) -> &[PageId] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self, id: PageId) {
        if !self.pages.contains(&id) {
            self.pages.push(id);
        }
    }

    pub fn remove_page(&mut self, id: PageId) {
        self.pages.retain(|p| *p != id);
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn record_inserted(&mut self, count: u64) {
        self.row_count += count;
    }

    pub fn record_removed(&mut self, count: u64) {
        self.row_count = self.row_count.saturating_sub(count);
    }
}
