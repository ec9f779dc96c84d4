//! Hand-rolled, position-tracking lexer for the assembly language.
//!
//! The lexer never aborts on bad input: illegal bytes and out-of-range
//! integers are reported as diagnostics pushed onto a caller-supplied buffer,
//! and `illegal` is itself a token the caller can recover from.

use std::fmt;

/// A line/column pair, 1-indexed, as they appear in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Position { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// One lexical token, borrowing from the source it was lexed out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    EndOfInput,
    Illegal,
    Integer(i64),
    Identifier(&'a str),
    Register(u8),
    Label(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub pos: Position,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind<'a>, pos: Position) -> Self {
        Token { kind, pos }
    }
}

/// A diagnostic raised directly by the lexer (illegal byte, overflowing
/// integer literal). Carries the same shape as every other error in this
/// crate so it can be rendered by [`crate::logging`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub pos: Position,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LexError {}

/// Owns the cursor into the source text and the running line/column count.
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.offset += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.col)
    }

    /// Skip whitespace, commas (a liberal separator, not grammar) and
    /// `;`-to-end-of-line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' || b == b',' => {
                    self.advance();
                }
                Some(b';') => {
                    self.consume_until_newline();
                }
                _ => break,
            }
        }
    }

    /// Error-recovery helper: advance the cursor to the next newline
    /// (or end of input), without consuming the newline itself.
    pub fn consume_until_newline(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_integer(&mut self, start: Position, errors: &mut Vec<LexError>) -> Token<'a> {
        let start_off = self.offset;
        if self.peek_byte() == Some(b'-') {
            self.advance();
        }
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }
        let text = &self.src[start_off..self.offset];
        match text.parse::<i64>() {
            Ok(v) => Token::new(TokenKind::Integer(v), start),
            Err(_) => {
                errors.push(LexError {
                    message: format!("integer literal '{text}' out of range"),
                    pos: start,
                });
                Token::new(TokenKind::Illegal, start)
            }
        }
    }

    fn lex_identifier(&mut self, start: Position) -> Token<'a> {
        let start_off = self.offset;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance();
        }
        let text = &self.src[start_off..self.offset];

        if self.peek_byte() == Some(b':') {
            self.advance();
            return Token::new(TokenKind::Label(text), start);
        }

        if text.len() >= 2 && text.as_bytes()[0] == b'r' && text.as_bytes()[1].is_ascii_digit() {
            if let Ok(idx) = text[1..].parse::<u16>() {
                if idx <= u8::MAX as u16 {
                    return Token::new(TokenKind::Register(idx as u8), start);
                }
            }
        }

        Token::new(TokenKind::Identifier(text), start)
    }

    /// Produce the next token, reporting any lexical errors into `errors`.
    pub fn next(&mut self, errors: &mut Vec<LexError>) -> Token<'a> {
        self.skip_trivia();
        let start = self.pos();

        let b = match self.peek_byte() {
            Some(b) => b,
            None => return Token::new(TokenKind::EndOfInput, start),
        };

        if b.is_ascii_digit() || (b == b'-' && matches!(self.peek_byte_at(1), Some(d) if d.is_ascii_digit())) {
            return self.lex_integer(start, errors);
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            return self.lex_identifier(start);
        }

        self.advance();
        errors.push(LexError {
            message: format!("illegal character '{}'", b as char),
            pos: start,
        });
        Token::new(TokenKind::Illegal, start)
    }

    /// Look `n` tokens ahead (`peek(0)` is what `next` would return next)
    /// without moving the cursor. Lexical errors seen while peeking are
    /// discarded; the same error is reported again, once, when `next`
    /// actually reaches that token.
    pub fn peek(&self, n: usize) -> Token<'a> {
        let mut scratch = Lexer {
            src: self.src,
            bytes: self.bytes,
            offset: self.offset,
            line: self.line,
            col: self.col,
        };
        let mut discard = Vec::new();
        let mut tok = scratch.next(&mut discard);
        for _ in 0..n {
            tok = scratch.next(&mut discard);
        }
        tok
    }
}
