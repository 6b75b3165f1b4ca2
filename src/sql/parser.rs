//! Recursive-descent SQL parser for MiniSQL
//!
//! Consumes one `;`-terminated statement per call; `parse_batch` walks a
//! whole script, resynchronizing at the next `;` after a syntax error so
//! one bad statement does not abort the batch. The parser enforces
//! grammar shape only and never consults the catalog.

use crate::catalog::DataType;
use crate::error::{Error, Result};
use crate::sql::ast::{
    Assignment, ColumnDef, CompareOp, Comparison, Condition, Connective, CreateTable, Delete,
    Insert, Literal, Projection, Select, Statement, Update,
};
use crate::sql::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// The token stream must end with an EOF token, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, position: 0 }
    }

    /// Parse a single statement, consuming its terminating `;`.
    pub fn parse(&mut self) -> Result<Statement> {
        let statement = self.parse_statement()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(statement)
    }

    /// Parse every statement in the stream. A syntax error is recorded
    /// for its statement and parsing resumes after the next `;`.
    pub fn parse_batch(&mut self) -> Vec<Result<Statement>> {
        let mut results = Vec::new();
        loop {
            while self.check(TokenKind::Semicolon) {
                self.advance();
            }
            if self.at_end() {
                return results;
            }
            match self.parse() {
                Ok(statement) => results.push(Ok(statement)),
                Err(err) => {
                    results.push(Err(err));
                    self.synchronize();
                }
            }
        }
    }

    pub fn at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current().kind {
            TokenKind::Create => self.parse_create_table(),
            TokenKind::Insert => self.parse_insert(),
            TokenKind::Select => self.parse_select(),
            TokenKind::Delete => self.parse_delete(),
            TokenKind::Update => self.parse_update(),
            _ => Err(self.expected_keyword("CREATE, INSERT, SELECT, DELETE or UPDATE")),
        }
    }

    // CREATE TABLE name '(' column_def (',' column_def)* ')' ';'
    fn parse_create_table(&mut self) -> Result<Statement> {
        self.advance(); // CREATE
        self.expect_keyword(TokenKind::Table, "TABLE")?;
        let table = self.parse_table_name()?;
        self.expect(TokenKind::LeftParen)?;
        let mut columns = vec![self.parse_column_def()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            columns.push(self.parse_column_def()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(Statement::CreateTable(CreateTable { table, columns }))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        Ok(ColumnDef { name, data_type })
    }

    // Type names are lexed as identifiers; the closed statement keyword
    // set does not include them.
    fn parse_data_type(&mut self) -> Result<DataType> {
        let token = self.current().clone();
        if token.kind == TokenKind::Identifier {
            if token.lexeme.eq_ignore_ascii_case("INT") {
                self.advance();
                return Ok(DataType::Int);
            }
            if token.lexeme.eq_ignore_ascii_case("VARCHAR") {
                self.advance();
                return Ok(DataType::Varchar);
            }
        }
        Err(Error::ExpectedKeyword {
            keyword: "INT or VARCHAR",
            found: token.describe(),
            line: token.line,
            column: token.column,
        })
    }

    // INSERT INTO name ['(' ident (',' ident)* ')'] VALUES '(' literal (',' literal)* ')' ';'
    fn parse_insert(&mut self) -> Result<Statement> {
        self.advance(); // INSERT
        self.expect_keyword(TokenKind::Into, "INTO")?;
        let table = self.parse_table_name()?;

        let columns = if self.check(TokenKind::LeftParen) {
            self.advance();
            let mut names = vec![self.expect_identifier()?];
            while self.check(TokenKind::Comma) {
                self.advance();
                names.push(self.expect_identifier()?);
            }
            self.expect(TokenKind::RightParen)?;
            Some(names)
        } else {
            None
        };

        self.expect_keyword(TokenKind::Values, "VALUES")?;
        self.expect(TokenKind::LeftParen)?;
        let mut values = vec![self.parse_literal()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            values.push(self.parse_literal()?);
        }
        self.expect(TokenKind::RightParen)?;
        Ok(Statement::Insert(Insert {
            table,
            columns,
            values,
        }))
    }

    // SELECT ('*' | ident (',' ident)*) FROM name [WHERE condition] ';'
    fn parse_select(&mut self) -> Result<Statement> {
        self.advance(); // SELECT
        let projection = if self.check(TokenKind::Asterisk) {
            self.advance();
            Projection::All
        } else {
            let mut names = vec![self.expect_identifier()?];
            while self.check(TokenKind::Comma) {
                self.advance();
                names.push(self.expect_identifier()?);
            }
            Projection::Columns(names)
        };
        self.expect_keyword(TokenKind::From, "FROM")?;
        let table = self.parse_table_name()?;
        let filter = self.parse_optional_where()?;
        Ok(Statement::Select(Select {
            table,
            projection,
            filter,
        }))
    }

    // DELETE FROM name [WHERE condition] ';'
    fn parse_delete(&mut self) -> Result<Statement> {
        self.advance(); // DELETE
        self.expect_keyword(TokenKind::From, "FROM")?;
        let table = self.parse_table_name()?;
        let filter = self.parse_optional_where()?;
        Ok(Statement::Delete(Delete { table, filter }))
    }

    // UPDATE name SET ident '=' literal (',' ident '=' literal)* [WHERE condition] ';'
    fn parse_update(&mut self) -> Result<Statement> {
        self.advance(); // UPDATE
        let table = self.parse_table_name()?;
        self.expect_keyword(TokenKind::Set, "SET")?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            assignments.push(self.parse_assignment()?);
        }
        let filter = self.parse_optional_where()?;
        Ok(Statement::Update(Update {
            table,
            assignments,
            filter,
        }))
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let column = self.expect_identifier()?;
        if !self.check(TokenKind::Equal) {
            let token = self.current();
            return Err(Error::ExpectedOperator {
                found: token.describe(),
                line: token.line,
                column: token.column,
            });
        }
        self.advance();
        let value = self.parse_literal()?;
        Ok(Assignment { column, value })
    }

    fn parse_optional_where(&mut self) -> Result<Option<Condition>> {
        if self.check(TokenKind::Where) {
            self.advance();
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    // condition := ident cmp_op literal ((AND|OR) ident cmp_op literal)*
    // The connective must be uniform across the clause; mixing AND with
    // OR has no defined precedence here and is rejected.
    fn parse_condition(&mut self) -> Result<Condition> {
        let mut condition = Condition::single(self.parse_comparison()?);
        let mut connective: Option<Connective> = None;
        loop {
            let next = match self.current().kind {
                TokenKind::And => Connective::And,
                TokenKind::Or => Connective::Or,
                _ => return Ok(condition),
            };
            let token = self.current().clone();
            match connective {
                None => {
                    connective = Some(next);
                    condition.connective = next;
                }
                Some(prev) if prev != next => {
                    return Err(Error::Unsupported {
                        construct: "mixed AND and OR in one WHERE clause".to_string(),
                        line: token.line,
                        column: token.column,
                    });
                }
                Some(_) => {}
            }
            self.advance();
            condition.terms.push(self.parse_comparison()?);
        }
    }

    fn parse_comparison(&mut self) -> Result<Comparison> {
        let column = self.expect_identifier()?;
        let token = self.current().clone();
        let op = match token.kind {
            TokenKind::Equal => CompareOp::Eq,
            TokenKind::NotEqual => CompareOp::NotEq,
            TokenKind::Greater => CompareOp::Gt,
            TokenKind::Less => CompareOp::Lt,
            TokenKind::GreaterEqual => CompareOp::Ge,
            TokenKind::LessEqual => CompareOp::Le,
            _ => {
                return Err(Error::ExpectedOperator {
                    found: token.describe(),
                    line: token.line,
                    column: token.column,
                })
            }
        };
        self.advance();
        let value = self.parse_literal()?;
        Ok(Comparison { column, op, value })
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| Error::ExpectedValue {
                    found: token.describe(),
                    line: token.line,
                    column: token.column,
                })?;
                Ok(Literal::Integer(value))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Literal::Text(token.lexeme))
            }
            TokenKind::Select => Err(Error::Unsupported {
                construct: "nested SELECT as a value".to_string(),
                line: token.line,
                column: token.column,
            }),
            _ => Err(Error::ExpectedValue {
                found: token.describe(),
                line: token.line,
                column: token.column,
            }),
        }
    }

    /// A table name position. A nested SELECT here (bare or
    /// parenthesized) is rejected explicitly rather than misread.
    fn parse_table_name(&mut self) -> Result<String> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Select => Err(Error::Unsupported {
                construct: "nested SELECT as a table source".to_string(),
                line: token.line,
                column: token.column,
            }),
            TokenKind::LeftParen if self.peek_kind() == TokenKind::Select => {
                Err(Error::Unsupported {
                    construct: "nested SELECT as a table source".to_string(),
                    line: token.line,
                    column: token.column,
                })
            }
            _ => self.expect_identifier(),
        }
    }

    // ---- token-stream helpers ----

    fn current(&self) -> &Token {
        // the stream always ends with EOF
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.position + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.current();
        let (found, line, column) = (token.describe(), token.line, token.column);
        Err(match kind {
            TokenKind::LeftParen => Error::ExpectedLeftParen { found, line, column },
            TokenKind::RightParen => Error::ExpectedRightParen { found, line, column },
            TokenKind::Semicolon => Error::ExpectedSemicolon { found, line, column },
            _ => Error::ExpectedIdentifier { found, line, column },
        })
    }

    fn expect_keyword(&mut self, kind: TokenKind, name: &'static str) -> Result<()> {
        if self.check(kind) {
            self.advance();
            return Ok(());
        }
        Err(self.expected_keyword(name))
    }

    fn expected_keyword(&self, name: &'static str) -> Error {
        let token = self.current();
        Error::ExpectedKeyword {
            keyword: name,
            found: token.describe(),
            line: token.line,
            column: token.column,
        }
    }

    /// Names accept a plain identifier or a quoted (string) token, which
    /// is how reserved-word-like names are spelled.
    fn expect_identifier(&mut self) -> Result<String> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier | TokenKind::StringLiteral => {
                self.advance();
                Ok(token.lexeme)
            }
            _ => Err(Error::ExpectedIdentifier {
                found: token.describe(),
                line: token.line,
                column: token.column,
            }),
        }
    }

    /// Skip tokens until just past the next `;`, or to end of input.
    fn synchronize(&mut self) {
        while !self.at_end() {
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
        }
    }
}
