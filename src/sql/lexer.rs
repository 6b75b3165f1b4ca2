//! SQL lexer for MiniSQL
//!
//! Turns raw SQL text into a token stream. Pure: no side effects, the
//! same input always yields the same tokens. Whitespace and `--` line
//! comments are skipped; every other byte must lex or the whole input
//! is rejected with a positioned lexical error.

use crate::error::{Error, Result};
use crate::sql::token::{Token, TokenKind};

/// Hand-written scanner over a character buffer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Lex the entire input, appending a final EOF token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (line, column) = (self.line, self.column);
            let Some(ch) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", line, column));
                return Ok(tokens);
            };

            let token = match ch {
                '\'' | '"' => self.read_string(ch)?,
                c if c.is_ascii_digit() => self.read_number(),
                c if c.is_alphabetic() || c == '_' => self.read_word(),
                '=' => self.single(TokenKind::Equal),
                '>' => self.maybe_equal(TokenKind::Greater, TokenKind::GreaterEqual),
                '<' => self.maybe_equal(TokenKind::Less, TokenKind::LessEqual),
                '!' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Token::new(TokenKind::NotEqual, "!=", line, column)
                    } else {
                        return Err(Error::IllegalCharacter { ch: '!', line, column });
                    }
                }
                '(' => self.single(TokenKind::LeftParen),
                ')' => self.single(TokenKind::RightParen),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semicolon),
                '*' => self.single(TokenKind::Asterisk),
                other => {
                    return Err(Error::IllegalCharacter {
                        ch: other,
                        line,
                        column,
                    })
                }
            };
            tokens.push(token);
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_next() == Some('-') => {
                    // line comment: consume to end of line
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let (line, column) = (self.line, self.column);
        let ch = self.advance().unwrap_or_default();
        Token::new(kind, ch.to_string(), line, column)
    }

    fn maybe_equal(&mut self, bare: TokenKind, with_eq: TokenKind) -> Token {
        let (line, column) = (self.line, self.column);
        let first = self.advance().unwrap_or_default();
        if self.peek() == Some('=') {
            self.advance();
            Token::new(with_eq, format!("{}=", first), line, column)
        } else {
            Token::new(bare, first.to_string(), line, column)
        }
    }

    /// A string literal delimited by `'` or `"`, with doubled-quote
    /// escaping. The closing quote must arrive before the end of the
    /// line or the input.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(Error::UnterminatedString { line, column });
                }
                Some(c) if c == quote => {
                    self.advance();
                    if self.peek() == Some(quote) {
                        // doubled quote: literal quote character
                        value.push(quote);
                        self.advance();
                    } else {
                        return Ok(Token::new(TokenKind::StringLiteral, value, line, column));
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Integer, value, line, column)
    }

    fn read_word(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::from_keyword(&value).unwrap_or(TokenKind::Identifier);
        Token::new(kind, value, line, column)
    }
}
