//! SQL front end: lexer, parser, semantic analyzer

pub mod analyzer;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use analyzer::{Analyzer, BoundStatement};
pub use ast::Statement;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};
