//! System catalog for MiniSQL
//!
//! Maps table names to schemas, preserving creation order. The catalog
//! is an explicitly owned value constructed once per connection and
//! passed by reference through analyzer and executor; there is no
//! global state. It serializes as JSON inside the backing file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::schema::TableSchema;
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Catalog {
    tables: IndexMap<String, TableSchema>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Register a new table. A table name, once created, cannot be
    /// reused without an explicit drop.
    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::TableExists(name));
        }
        info!(table = %name, columns = schema.column_count(), "created table");
        self.tables.insert(name, schema);
        Ok(())
    }

    /// Remove a table, returning its schema so the caller can release
    /// the pages it owned.
    pub fn drop_table(&mut self, name: &str) -> Result<TableSchema> {
        let schema = self
            .tables
            .shift_remove(name)
            .ok_or_else(|| Error::TableNotExists(name.to_string()))?;
        info!(table = %name, "dropped table");
        Ok(schema)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in creation order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
