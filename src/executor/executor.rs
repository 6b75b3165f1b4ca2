//! Statement execution for MiniSQL
//!
//! The executor interprets a bound statement against the catalog and
//! storage engine. Mutating statements evaluate their predicate over
//! every row first and modify pages second, so an evaluation error
//! never leaves a partially applied row set.

use tracing::debug;

use crate::catalog::{Catalog, TableSchema};
use crate::error::{Error, Result};
use crate::sql::analyzer::BoundStatement;
use crate::sql::ast::{CompareOp, Condition, Connective};
use crate::storage::page::PageId;
use crate::storage::{Row, StorageEngine, Value};

/// The outcome of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Query result: projected rows in storage (insertion) order
    Rows { columns: Vec<String>, rows: Vec<Row> },
    /// Mutation result: number of rows inserted/deleted/updated
    Affected { count: usize },
    /// DDL result
    SchemaChange { table: String },
}

impl ExecutionResult {
    pub fn row_count(&self) -> usize {
        match self {
            ExecutionResult::Rows { rows, .. } => rows.len(),
            _ => 0,
        }
    }
}

pub struct Executor<'a> {
    catalog: &'a mut Catalog,
    storage: &'a mut StorageEngine,
}

impl<'a> Executor<'a> {
    pub fn new(catalog: &'a mut Catalog, storage: &'a mut StorageEngine) -> Self {
        Executor { catalog, storage }
    }

    pub fn execute(&mut self, statement: BoundStatement) -> Result<ExecutionResult> {
        match statement {
            BoundStatement::CreateTable { table, columns } => {
                self.catalog.create_table(TableSchema::new(&table, columns))?;
                Ok(ExecutionResult::SchemaChange { table })
            }
            BoundStatement::Insert { table, row } => self.execute_insert(&table, row),
            BoundStatement::Select {
                table,
                columns,
                filter,
            } => self.execute_select(&table, columns, filter.as_ref()),
            BoundStatement::Delete { table, filter } => {
                self.execute_delete(&table, filter.as_ref())
            }
            BoundStatement::Update {
                table,
                assignments,
                filter,
            } => self.execute_update(&table, &assignments, filter.as_ref()),
        }
    }

    fn execute_insert(&mut self, table: &str, row: Row) -> Result<ExecutionResult> {
        let pages = self.schema(table)?.pages().to_vec();
        let page_id = self.storage.allocate_page(table, &pages)?;
        self.storage.get_page_mut(page_id)?.insert_row(row)?;
        let schema = self.schema_mut(table)?;
        schema.add_page(page_id);
        schema.record_inserted(1);
        debug!(table = %table, page = page_id, "inserted row");
        Ok(ExecutionResult::Affected { count: 1 })
    }

    fn execute_select(
        &mut self,
        table: &str,
        columns: Vec<String>,
        filter: Option<&Condition>,
    ) -> Result<ExecutionResult> {
        let pages = self.schema(table)?.pages().to_vec();
        let mut rows = Vec::new();
        for page_id in pages {
            let page = self.storage.get_page(page_id)?;
            for row in page.rows() {
                if evaluate(filter, row)? {
                    rows.push(row.project(&columns));
                }
            }
        }
        Ok(ExecutionResult::Rows { columns, rows })
    }

    fn execute_delete(
        &mut self,
        table: &str,
        filter: Option<&Condition>,
    ) -> Result<ExecutionResult> {
        let plan = self.plan_matches(table, filter)?;
        let mut count = 0;
        for (page_id, slots) in plan {
            let page = self.storage.get_page_mut(page_id)?;
            count += page.remove_at(&slots);
            if page.is_empty() {
                self.storage.free_page(page_id)?;
                self.schema_mut(table)?.remove_page(page_id);
            }
        }
        self.schema_mut(table)?.record_removed(count as u64);
        debug!(table = %table, count, "deleted rows");
        Ok(ExecutionResult::Affected { count })
    }

    fn execute_update(
        &mut self,
        table: &str,
        assignments: &[(String, Value)],
        filter: Option<&Condition>,
    ) -> Result<ExecutionResult> {
        let plan = self.plan_matches(table, filter)?;
        let mut count = 0;
        for (page_id, slots) in plan {
            for slot in slots {
                let page = self.storage.get_page_mut(page_id)?;
                let Some(row) = page.row_mut(slot) else {
                    continue;
                };
                for (column, value) in assignments {
                    row.set(column.clone(), value.clone());
                }
                count += 1;
            }
        }
        debug!(table = %table, count, "updated rows");
        Ok(ExecutionResult::Affected { count })
    }

    /// First pass of DELETE/UPDATE: evaluate the predicate over every
    /// row and record the matching slots per page. Nothing is mutated
    /// until this completes.
    fn plan_matches(
        &mut self,
        table: &str,
        filter: Option<&Condition>,
    ) -> Result<Vec<(PageId, Vec<usize>)>> {
        let pages = self.schema(table)?.pages().to_vec();
        let mut plan = Vec::new();
        for page_id in pages {
            let page = self.storage.get_page(page_id)?;
            let mut slots = Vec::new();
            for (slot, row) in page.rows().iter().enumerate() {
                if evaluate(filter, row)? {
                    slots.push(slot);
                }
            }
            if !slots.is_empty() {
                plan.push((page_id, slots));
            }
        }
        Ok(plan)
    }

    // the analyzer has approved the statement, but table presence is
    // still re-checked at run time
    fn schema(&self, table: &str) -> Result<&TableSchema> {
        self.catalog
            .table(table)
            .ok_or_else(|| Error::RuntimeTableNotFound(table.to_string()))
    }

    fn schema_mut(&mut self, table: &str) -> Result<&mut TableSchema> {
        self.catalog
            .table_mut(table)
            .ok_or_else(|| Error::RuntimeTableNotFound(table.to_string()))
    }
}

/// Evaluate a WHERE clause against one row. Terms combine under the
/// clause's single connective; no WHERE matches everything.
fn evaluate(filter: Option<&Condition>, row: &Row) -> Result<bool> {
    let Some(condition) = filter else {
        return Ok(true);
    };
    let mut results = Vec::with_capacity(condition.terms.len());
    for term in &condition.terms {
        let value = row.get(&term.column).ok_or_else(|| Error::ColumnNotExists {
            table: String::new(),
            column: term.column.clone(),
        })?;
        let ordering = value
            .compare_literal(&term.value)
            .ok_or_else(|| Error::TypeMismatch {
                column: term.column.clone(),
                expected: value.data_type().to_string(),
                found: term.value.type_name().to_string(),
            })?;
        let matched = match term.op {
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::NotEq => ordering.is_ne(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Ge => ordering.is_ge(),
            CompareOp::Le => ordering.is_le(),
        };
        results.push(matched);
    }
    Ok(match condition.connective {
        Connective::And => results.iter().all(|m| *m),
        Connective::Or => results.iter().any(|m| *m),
    })
}
