//! SQL tokens for MiniSQL
//!
//! A token pairs a kind with the lexeme text and its 1-based source
//! position. Keywords are a closed set, matched case-insensitively.

use std::fmt;

/// The kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Create,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Delete,
    Update,
    Set,
    And,
    Or,

    // Identifiers and literals
    Identifier,
    Integer,
    StringLiteral,

    // Operators
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,

    // Punctuation
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Asterisk,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Map a word to its keyword kind, case-insensitively.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        match word.to_uppercase().as_str() {
            "CREATE" => Some(TokenKind::Create),
            "TABLE" => Some(TokenKind::Table),
            "INSERT" => Some(TokenKind::Insert),
            "INTO" => Some(TokenKind::Into),
            "VALUES" => Some(TokenKind::Values),
            "SELECT" => Some(TokenKind::Select),
            "FROM" => Some(TokenKind::From),
            "WHERE" => Some(TokenKind::Where),
            "DELETE" => Some(TokenKind::Delete),
            "UPDATE" => Some(TokenKind::Update),
            "SET" => Some(TokenKind::Set),
            "AND" => Some(TokenKind::And),
            "OR" => Some(TokenKind::Or),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Create
                | TokenKind::Table
                | TokenKind::Insert
                | TokenKind::Into
                | TokenKind::Values
                | TokenKind::Select
                | TokenKind::From
                | TokenKind::Where
                | TokenKind::Delete
                | TokenKind::Update
                | TokenKind::Set
                | TokenKind::And
                | TokenKind::Or
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Create => "CREATE",
            TokenKind::Table => "TABLE",
            TokenKind::Insert => "INSERT",
            TokenKind::Into => "INTO",
            TokenKind::Values => "VALUES",
            TokenKind::Select => "SELECT",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::Delete => "DELETE",
            TokenKind::Update => "UPDATE",
            TokenKind::Set => "SET",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Identifier => "identifier",
            TokenKind::Integer => "integer literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Equal => "=",
            TokenKind::NotEqual => "!=",
            TokenKind::Greater => ">",
            TokenKind::Less => "<",
            TokenKind::GreaterEqual => ">=",
            TokenKind::LessEqual => "<=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Asterisk => "*",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", s)
    }
}

/// A lexed token: kind, lexeme text, and source position (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// How this token reads in an error message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}:{}]", self.kind, self.lexeme, self.line, self.column)
    }
}
