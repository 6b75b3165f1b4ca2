//! Data types for MiniSQL
//!
//! The engine supports exactly two column types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    Int,
    /// Variable-length character string
    Varchar,
}

impl DataType {
    /// Check whether a literal of the given kind can bind to this type.
    /// There is no coercion: integers to INT, strings to VARCHAR.
    pub fn accepts(&self, literal: &crate::sql::ast::Literal) -> bool {
        matches!(
            (self, literal),
            (DataType::Int, crate::sql::ast::Literal::Integer(_))
                | (DataType::Varchar, crate::sql::ast::Literal::Text(_))
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Literal;

    #[test]
    fn test_display() {
        assert_eq!(DataType::Int.to_string(), "INT");
        assert_eq!(DataType::Varchar.to_string(), "VARCHAR");
    }

    #[test]
    fn test_no_coercion() {
        assert!(DataType::Int.accepts(&Literal::Integer(1)));
        assert!(!DataType::Int.accepts(&Literal::Text("1".to_string())));
        assert!(DataType::Varchar.accepts(&Literal::Text("x".to_string())));
        assert!(!DataType::Varchar.accepts(&Literal::Integer(0)));
    }
}
