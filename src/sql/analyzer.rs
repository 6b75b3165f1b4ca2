//! Semantic analysis for MiniSQL
//!
//! Validates a parsed statement against the catalog and produces a
//! bound statement ready for execution. Analysis is pure: the catalog
//! is only read here; even for CREATE TABLE the mutation happens in the
//! executor, gated on this approval.

use crate::catalog::{Catalog, Column, TableSchema};
use crate::error::{Error, Result};
use crate::sql::ast::{Condition, CreateTable, Delete, Insert, Select, Statement, Update};
use crate::sql::ast::{Literal, Projection};
use crate::storage::{Row, Value};

/// A statement validated against the catalog
#[derive(Debug, Clone)]
pub enum BoundStatement {
    CreateTable {
        table: String,
        columns: Vec<Column>,
    },
    Insert {
        table: String,
        row: Row,
    },
    Select {
        table: String,
        columns: Vec<String>,
        filter: Option<Condition>,
    },
    Delete {
        table: String,
        filter: Option<Condition>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        filter: Option<Condition>,
    },
}

pub struct Analyzer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Analyzer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Analyzer { catalog }
    }

    pub fn analyze(&self, statement: &Statement) -> Result<BoundStatement> {
        match statement {
            Statement::CreateTable(s) => self.analyze_create_table(s),
            Statement::Insert(s) => self.analyze_insert(s),
            Statement::Select(s) => self.analyze_select(s),
            Statement::Delete(s) => self.analyze_delete(s),
            Statement::Update(s) => self.analyze_update(s),
        }
    }

    fn analyze_create_table(&self, stmt: &CreateTable) -> Result<BoundStatement> {
        if self.catalog.contains(&stmt.table) {
            return Err(Error::TableExists(stmt.table.clone()));
        }
        let mut columns: Vec<Column> = Vec::with_capacity(stmt.columns.len());
        for def in &stmt.columns {
            if columns.iter().any(|c| c.name == def.name) {
                return Err(Error::DuplicateColumn {
                    table: stmt.table.clone(),
                    column: def.name.clone(),
                });
            }
            columns.push(Column::new(def.name.clone(), def.data_type));
        }
        Ok(BoundStatement::CreateTable {
            table: stmt.table.clone(),
            columns,
        })
    }

    fn analyze_insert(&self, stmt: &Insert) -> Result<BoundStatement> {
        let schema = self.lookup(&stmt.table)?;

        // without an explicit list, values bind positionally in
        // declared column order
        let columns: Vec<String> = match &stmt.columns {
            Some(names) => names.clone(),
            None => schema.column_names(),
        };

        for (i, name) in columns.iter().enumerate() {
            if !schema.has_column(name) {
                return Err(Error::ColumnNotExists {
                    table: stmt.table.clone(),
                    column: name.clone(),
                });
            }
            if columns[..i].contains(name) {
                return Err(Error::DuplicateColumn {
                    table: stmt.table.clone(),
                    column: name.clone(),
                });
            }
        }
        if columns.len() != stmt.values.len() {
            return Err(Error::ColumnCountMismatch {
                columns: columns.len(),
                values: stmt.values.len(),
            });
        }
        for (name, literal) in columns.iter().zip(&stmt.values) {
            self.check_literal(schema, name, literal)?;
        }
        // no NULLs or defaults: every column of the table must be covered
        if columns.len() != schema.column_count() {
            return Err(Error::ColumnCountMismatch {
                columns: schema.column_count(),
                values: columns.len(),
            });
        }

        // build the row in declared column order
        let mut row = Row::new();
        for column in schema.columns() {
            let index = columns
                .iter()
                .position(|n| n == &column.name)
                .unwrap_or_default();
            row.set(column.name.clone(), Value::from(&stmt.values[index]));
        }
        Ok(BoundStatement::Insert {
            table: stmt.table.clone(),
            row,
        })
    }

    fn analyze_select(&self, stmt: &Select) -> Result<BoundStatement> {
        let schema = self.lookup(&stmt.table)?;
        let columns = match &stmt.projection {
            Projection::All => schema.column_names(),
            Projection::Columns(names) => {
                for name in names {
                    if !schema.has_column(name) {
                        return Err(Error::ColumnNotExists {
                            table: stmt.table.clone(),
                            column: name.clone(),
                        });
                    }
                }
                names.clone()
            }
        };
        self.check_filter(schema, stmt.filter.as_ref())?;
        Ok(BoundStatement::Select {
            table: stmt.table.clone(),
            columns,
            filter: stmt.filter.clone(),
        })
    }

    fn analyze_delete(&self, stmt: &Delete) -> Result<BoundStatement> {
        let schema = self.lookup(&stmt.table)?;
        self.check_filter(schema, stmt.filter.as_ref())?;
        Ok(BoundStatement::Delete {
            table: stmt.table.clone(),
            filter: stmt.filter.clone(),
        })
    }

    fn analyze_update(&self, stmt: &Update) -> Result<BoundStatement> {
        let schema = self.lookup(&stmt.table)?;
        let mut assignments = Vec::with_capacity(stmt.assignments.len());
        for assignment in &stmt.assignments {
            self.check_literal(schema, &assignment.column, &assignment.value)?;
            assignments.push((assignment.column.clone(), Value::from(&assignment.value)));
        }
        self.check_filter(schema, stmt.filter.as_ref())?;
        Ok(BoundStatement::Update {
            table: stmt.table.clone(),
            assignments,
            filter: stmt.filter.clone(),
        })
    }

    fn lookup(&self, table: &str) -> Result<&TableSchema> {
        self.catalog
            .table(table)
            .ok_or_else(|| Error::TableNotExists(table.to_string()))
    }

    fn check_filter(&self, schema: &TableSchema, filter: Option<&Condition>) -> Result<()> {
        let Some(condition) = filter else {
            return Ok(());
        };
        for term in &condition.terms {
            self.check_literal(schema, &term.column, &term.value)?;
        }
        Ok(())
    }

    /// The column must exist and the literal's kind must match its
    /// declared type exactly.
    fn check_literal(&self, schema: &TableSchema, column: &str, literal: &Literal) -> Result<()> {
        let def = schema.column(column).ok_or_else(|| Error::ColumnNotExists {
            table: schema.name().to_string(),
            column: column.to_string(),
        })?;
        if !def.data_type.accepts(literal) {
            return Err(Error::TypeMismatch {
                column: column.to_string(),
                expected: def.data_type.to_string(),
                found: literal.type_name().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;
    use crate::sql::lexer::Lexer;
    use crate::sql::parser::Parser;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .create_table(TableSchema::new(
                "student",
                vec![
                    Column::new("id", DataType::Int),
                    Column::new("name", DataType::Varchar),
                    Column::new("age", DataType::Int),
                ],
            ))
            .unwrap();
        catalog
    }

    fn analyze(sql: &str, catalog: &Catalog) -> Result<BoundStatement> {
        let tokens = Lexer::new(sql).tokenize()?;
        let statement = Parser::new(tokens).parse()?;
        Analyzer::new(catalog).analyze(&statement)
    }

    #[test]
    fn test_create_existing_table() {
        let catalog = catalog();
        let err = analyze("CREATE TABLE student(id INT);", &catalog).unwrap_err();
        assert!(matches!(err, Error::TableExists(name) if name == "student"));
    }

    #[test]
    fn test_duplicate_column() {
        let catalog = Catalog::new();
        let err = analyze("CREATE TABLE test(id INT, id VARCHAR);", &catalog).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { column, .. } if column == "id"));
    }

    #[test]
    fn test_unknown_table_and_column() {
        let catalog = catalog();
        let err = analyze("SELECT * FROM course;", &catalog).unwrap_err();
        assert!(matches!(err, Error::TableNotExists(_)));

        let err = analyze("SELECT grade FROM student;", &catalog).unwrap_err();
        assert!(matches!(err, Error::ColumnNotExists { column, .. } if column == "grade"));

        let err = analyze("SELECT id FROM student WHERE height > 2;", &catalog).unwrap_err();
        assert!(matches!(err, Error::ColumnNotExists { column, .. } if column == "height"));
    }

    #[test]
    fn test_column_count_mismatch() {
        let catalog = catalog();
        let err = analyze(
            "INSERT INTO student(id, name) VALUES (1, 'Alice', 20);",
            &catalog,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnCountMismatch { columns: 2, values: 3 }
        ));
    }

    #[test]
    fn test_partial_insert_rejected() {
        let catalog = catalog();
        let err = analyze("INSERT INTO student(id, name) VALUES (1, 'Alice');", &catalog)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnCountMismatch { columns: 3, values: 2 }
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let catalog = catalog();
        let err = analyze(
            "INSERT INTO student(id, name, age) VALUES ('x', 'Alice', 20);",
            &catalog,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { column, .. } if column == "id"
        ));

        let err = analyze("UPDATE student SET age = 'old';", &catalog).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = analyze("SELECT * FROM student WHERE name = 5;", &catalog).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_positional_insert_binds_in_order() {
        let catalog = catalog();
        let bound = analyze("INSERT INTO student VALUES (1, 'Alice', 20);", &catalog).unwrap();
        let BoundStatement::Insert { row, .. } = bound else {
            panic!("expected insert");
        };
        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get("name"), Some(&Value::Text("Alice".to_string())));
        assert_eq!(row.get("age"), Some(&Value::Integer(20)));
    }

    #[test]
    fn test_reordered_insert_normalizes_to_schema_order() {
        let catalog = catalog();
        let bound = analyze(
            "INSERT INTO student(age, id, name) VALUES (20, 1, 'Alice');",
            &catalog,
        )
        .unwrap();
        let BoundStatement::Insert { row, .. } = bound else {
            panic!("expected insert");
        };
        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["id", "name", "age"]);
        assert_eq!(row.get("age"), Some(&Value::Integer(20)));
    }

    #[test]
    fn test_select_star_uses_declared_order() {
        let catalog = catalog();
        let bound = analyze("SELECT * FROM student;", &catalog).unwrap();
        let BoundStatement::Select { columns, .. } = bound else {
            panic!("expected select");
        };
        assert_eq!(columns, vec!["id", "name", "age"]);
    }
}
