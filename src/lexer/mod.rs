//! Shared lexer primitives: keyword table lookup and a char cursor with
//! line/column tracking. Each dialect builds its lexer on top of these,
//! scanning char-at-a-time through alphanumeric and numeric runs.
pub mod basic;
pub mod pascal;
pub mod viperlang;
pub mod zia;

use std::fmt;

use crate::source::SourceLoc;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub loc: SourceLoc,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.loc.line, self.loc.column, self.message)
    }
}

impl std::error::Error for LexError {}

/// Binary-search a sorted `(spelling, kind)` table. Callers are responsible
/// for keeping the table sorted by `spelling` and for case-folding `word`
/// first in case-insensitive dialects.
pub fn lookup_keyword(table: &[(&str, TokenKind)], word: &str) -> Option<TokenKind> {
    table
        .binary_search_by(|(spelling, _)| spelling.cmp(&word))
        .ok()
        .map(|idx| table[idx].1)
}

/// A char-at-a-time cursor over a source buffer, tracking byte offset plus
/// 1-based line/column. Shared by every dialect lexer so position-tracking
/// logic (and its off-by-one pitfalls) lives in exactly one place.
pub struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    pub file_id: u32,
    line: u32,
    column: u32,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, file_id: u32) -> Self {
        Cursor {
            chars: source.chars().collect(),
            pos: 0,
            file_id,
            line: 1,
            column: 1,
            source,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.file_id, self.line, self.column)
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    pub fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
}

/// A one-token-lookahead wrapper implementing the `next`/`peek` contract
/// that every dialect lexer must expose. Dialect lexers implement
/// `DialectLexer::lex_one` to produce raw tokens; this struct buffers one of
/// them and yields `Eof` indefinitely once the underlying source is spent.
pub trait DialectLexer {
    fn lex_one(&mut self) -> Token;
}

pub struct Lookahead<L: DialectLexer> {
    inner: L,
    buffered: Option<Token>,
    eof_loc: Option<SourceLoc>,
}

impl<L: DialectLexer> Lookahead<L> {
    pub fn new(inner: L) -> Self {
        Lookahead {
            inner,
            buffered: None,
            eof_loc: None,
        }
    }

    pub fn next(&mut self) -> Token {
        if let Some(tok) = self.buffered.take() {
            return tok;
        }
        self.produce()
    }

    pub fn peek(&mut self) -> &Token {
        if self.buffered.is_none() {
            let tok = self.produce();
            self.buffered = Some(tok);
        }
        self.buffered.as_ref().unwrap()
    }

    fn produce(&mut self) -> Token {
        if let Some(loc) = self.eof_loc {
            return Token::eof(loc);
        }
        let tok = self.inner.lex_one();
        if tok.kind == TokenKind::Eof {
            self.eof_loc = Some(tok.loc);
        }
        tok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_line_and_column_across_newlines() {
        let mut c = Cursor::new("ab\ncd", 0);
        assert_eq!(c.loc(), SourceLoc::new(0, 1, 1));
        c.advance();
        assert_eq!(c.loc(), SourceLoc::new(0, 1, 2));
        c.advance();
        assert_eq!(c.loc(), SourceLoc::new(0, 1, 3));
        c.advance(); // consumes '\n'
        assert_eq!(c.loc(), SourceLoc::new(0, 2, 1));
    }

    #[test]
    fn lookup_keyword_finds_sorted_entries() {
        let table: &[(&str, TokenKind)] = &[("else", TokenKind::KwElse), ("if", TokenKind::KwIf)];
        assert_eq!(lookup_keyword(table, "if"), Some(TokenKind::KwIf));
        assert_eq!(lookup_keyword(table, "nope"), None);
    }
}
