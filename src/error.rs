//! Error types for MiniSQL
//!
//! One enum covers the four stages of the pipeline: lexical, syntax,
//! semantic, and runtime. Every stage returns a typed error instead of
//! panicking; nothing here is fatal to the process.

use thiserror::Error;

/// The main error type for MiniSQL
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexical Errors ==========
    #[error("lexical error: illegal character '{ch}' at line {line}, column {column}")]
    IllegalCharacter { ch: char, line: usize, column: usize },

    #[error("lexical error: unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    // ========== Syntax Errors ==========
    #[error("syntax error: expected keyword {keyword}, found {found} at line {line}, column {column}")]
    ExpectedKeyword {
        keyword: &'static str,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected identifier, found {found} at line {line}, column {column}")]
    ExpectedIdentifier {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected '(', found {found} at line {line}, column {column}")]
    ExpectedLeftParen {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected ')', found {found} at line {line}, column {column}")]
    ExpectedRightParen {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected ';', found {found} at line {line}, column {column}")]
    ExpectedSemicolon {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected a literal value, found {found} at line {line}, column {column}")]
    ExpectedValue {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: expected comparison operator, found {found} at line {line}, column {column}")]
    ExpectedOperator {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error: unsupported construct: {construct} at line {line}, column {column}")]
    Unsupported {
        construct: String,
        line: usize,
        column: usize,
    },

    // ========== Semantic Errors ==========
    #[error("semantic error: table '{0}' already exists")]
    TableExists(String),

    #[error("semantic error: table '{0}' does not exist")]
    TableNotExists(String),

    #[error("semantic error: column '{column}' does not exist in table '{table}'")]
    ColumnNotExists { table: String, column: String },

    #[error("semantic error: duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("semantic error: column count mismatch: {columns} columns but {values} values")]
    ColumnCountMismatch { columns: usize, values: usize },

    #[error("semantic error: type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    // ========== Runtime Errors ==========
    #[error("runtime error: table '{0}' not found during execution")]
    RuntimeTableNotFound(String),

    #[error("runtime error: page {0} not found")]
    PageNotFound(u32),

    #[error("runtime error: page {0} is full")]
    PageFull(u32),

    #[error("runtime error: corrupt database file: {0}")]
    CorruptFile(String),

    #[error("runtime error: I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("runtime error: catalog serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for MiniSQL operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotExists("users".to_string());
        assert_eq!(err.to_string(), "semantic error: table 'users' does not exist");

        let err = Error::IllegalCharacter {
            ch: '@',
            line: 1,
            column: 5,
        };
        assert_eq!(
            err.to_string(),
            "lexical error: illegal character '@' at line 1, column 5"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::TypeMismatch {
            column: "id".to_string(),
            expected: "INT".to_string(),
            found: "string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "semantic error: type mismatch for column 'id': expected INT, found string"
        );
    }
}
