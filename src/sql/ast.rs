//! Statement AST for MiniSQL
//!
//! One node type per statement kind, mirroring the grammar. Conditions
//! are a flat chain of column-vs-literal comparisons joined by a single
//! connective; mixing AND with OR is rejected during parsing.

use std::fmt;

use crate::catalog::DataType;

/// A parsed SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTable),
    Insert(Insert),
    Select(Select),
    Delete(Delete),
    Update(Update),
}

impl Statement {
    /// The table this statement targets.
    pub fn table_name(&self) -> &str {
        match self {
            Statement::CreateTable(s) => &s.table,
            Statement::Insert(s) => &s.table,
            Statement::Select(s) => &s.table,
            Statement::Delete(s) => &s.table,
            Statement::Update(s) => &s.table,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

/// INSERT with an optional explicit column list; without one, values
/// bind positionally in declared column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub values: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub projection: Projection,
    pub filter: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filter: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub filter: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Literal,
}

/// A literal value as written in the statement text
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl Literal {
    /// How this literal's kind reads in a type error.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Text(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Comparison operators allowed in WHERE clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
        };
        write!(f, "{}", s)
    }
}

/// `column op literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub value: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// A WHERE clause: one or more comparisons joined by a uniform
/// connective. With a single term the connective is irrelevant.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub connective: Connective,
    pub terms: Vec<Comparison>,
}

impl Condition {
    pub fn single(term: Comparison) -> Self {
        Condition {
            connective: Connective::And,
            terms: vec![term],
        }
    }
}
