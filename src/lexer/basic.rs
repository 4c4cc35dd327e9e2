//! BASIC lexer: case-insensitive keywords, `'`/`REM` line comments, no block
//! comments (classic BASIC has none). Line numbers are plain `IntLiteral`
//! tokens; deciding whether a leading integer on a line is a line number is
//! the `StatementSequencer`'s job, not the lexer's.
use unescape::unescape;

use crate::lexer::{lookup_keyword, Cursor, DialectLexer, LexError};
use crate::token::{Token, TokenKind};

// Sorted by spelling; canonical spellings are upper-case because BASIC
// identifiers are case-folded to upper-case throughout this crate.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("AND", TokenKind::KwAnd),
    ("AS", TokenKind::KwAs),
    ("BREAK", TokenKind::KwBreak),
    ("CASE", TokenKind::KwCase),
    ("CONST", TokenKind::KwConst),
    ("CONTINUE", TokenKind::KwContinue),
    ("DIM", TokenKind::KwVar),
    ("DIV", TokenKind::KwDiv),
    ("DO", TokenKind::KwDo),
    ("ELSE", TokenKind::KwElse),
    ("ELSEIF", TokenKind::KwElseIf),
    ("END", TokenKind::KwEnd),
    ("FALSE", TokenKind::KwFalse),
    ("FOR", TokenKind::KwFor),
    ("FUNCTION", TokenKind::KwFunction),
    ("GOSUB", TokenKind::KwGosub),
    ("GOTO", TokenKind::KwGoto),
    ("IF", TokenKind::KwIf),
    ("LET", TokenKind::KwLet),
    ("LOOP", TokenKind::KwLoop),
    ("MOD", TokenKind::KwMod),
    ("NAMESPACE", TokenKind::KwNamespace),
    ("NEW", TokenKind::KwNew),
    ("NEXT", TokenKind::KwNext),
    ("NOT", TokenKind::KwNot),
    ("NULL", TokenKind::KwNull),
    ("OR", TokenKind::KwOr),
    ("PROPERTY", TokenKind::KwProperty),
    ("REM", TokenKind::KwRem),
    ("RETURN", TokenKind::KwReturn),
    ("SELECT", TokenKind::KwSelect),
    ("STEP", TokenKind::KwStep),
    ("SUB", TokenKind::KwSub),
    ("THEN", TokenKind::KwThen),
    ("TO", TokenKind::KwTo),
    ("TRUE", TokenKind::KwTrue),
    ("USING", TokenKind::KwUsing),
    ("WEND", TokenKind::KwWend),
    ("WHILE", TokenKind::KwWhile),
];

/// Owns its source and accumulates `LexError`s rather than emitting
/// through a `DiagnosticEmitter` directly — the parser
/// that drives this lexer drains `take_errors()` and re-reports them through
/// its own emitter, keeping lifetime plumbing out of the lexer.
pub struct BasicLexer<'a> {
    cursor: Cursor<'a>,
    errors: Vec<LexError>,
}

impl<'a> BasicLexer<'a> {
    pub fn new(source: &'a str, file_id: u32) -> Self {
        BasicLexer {
            cursor: Cursor::new(source, file_id),
            errors: Vec::new(),
        }
    }

    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let tok = self.lex_one();
            let is_eof = tok.kind == TokenKind::Eof;
            out.push(tok);
            if is_eof {
                break;
            }
        }
        out
    }

    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.cursor.advance();
                }
                Some('\'') => {
                    while let Some(c) = self.cursor.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_radix_literal(&mut self, prefix_len: usize, radix: u32, is_digit: impl Fn(char) -> bool) -> Token {
        let loc = self.cursor.loc();
        let mut text = String::new();
        for _ in 0..prefix_len {
            text.push(self.cursor.advance().unwrap());
        }
        let digits_start = text.len();
        while let Some(c) = self.cursor.peek() {
            if is_digit(c) {
                text.push(self.cursor.advance().unwrap());
            } else {
                break;
            }
        }
        let value = i64::from_str_radix(&text[digits_start..], radix).unwrap_or(0) as f64;
        Token::new(TokenKind::IntLiteral, text, loc).with_numeric(value)
    }

    fn lex_number(&mut self) -> Token {
        if self.cursor.peek() == Some('0') && matches!(self.cursor.peek_at(1), Some('x') | Some('X')) {
            return self.lex_radix_literal(2, 16, |c| c.is_ascii_hexdigit());
        }
        if self.cursor.peek() == Some('$') {
            return self.lex_radix_literal(1, 16, |c| c.is_ascii_hexdigit());
        }
        if self.cursor.peek() == Some('0') && matches!(self.cursor.peek_at(1), Some('b') | Some('B')) {
            return self.lex_radix_literal(2, 2, |c| c == '0' || c == '1');
        }
        let loc = self.cursor.loc();
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_digit() {
                text.push(self.cursor.advance().unwrap());
            } else {
                break;
            }
        }
        if self.cursor.peek() == Some('.') && self.cursor.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            text.push(self.cursor.advance().unwrap());
            while let Some(c) = self.cursor.peek() {
                if c.is_ascii_digit() {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
        }
        if matches!(self.cursor.peek(), Some('e') | Some('E')) {
            is_float = true;
            text.push(self.cursor.advance().unwrap());
            if matches!(self.cursor.peek(), Some('+') | Some('-')) {
                text.push(self.cursor.advance().unwrap());
            }
            while let Some(c) = self.cursor.peek() {
                if c.is_ascii_digit() {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
        }
        let kind = if is_float { TokenKind::NumberLiteral } else { TokenKind::IntLiteral };
        let value: f64 = text.parse().unwrap_or_else(|_| {
            self.errors.push(LexError {
                message: format!("malformed numeric literal '{text}'"),
                loc,
            });
            0.0
        });
        Token::new(kind, text, loc).with_numeric(value)
    }

    fn lex_string(&mut self) -> Token {
        let loc = self.cursor.loc();
        self.cursor.advance(); // opening quote
        let mut raw = String::from("\"");
        let mut escaped = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    self.errors.push(LexError {
                        message: "unterminated string literal".to_string(),
                        loc,
                    });
                    break;
                }
                Some('"') => {
                    raw.push(self.cursor.advance().unwrap());
                    break;
                }
                Some('\\') => {
                    raw.push(self.cursor.advance().unwrap());
                    escaped.push('\\');
                    if let Some(e) = self.cursor.advance() {
                        raw.push(e);
                        escaped.push(e);
                    }
                }
                Some(c) => {
                    raw.push(c);
                    escaped.push(c);
                    self.cursor.advance();
                }
            }
        }
        let value = unescape(&escaped).unwrap_or(escaped);
        Token::new(TokenKind::StringLiteral, raw, loc).with_string(value)
    }
}

impl<'a> DialectLexer for BasicLexer<'a> {
    fn lex_one(&mut self) -> Token {
        self.skip_trivia();
        let loc = self.cursor.loc();
        let Some(c) = self.cursor.peek() else {
            return Token::eof(loc);
        };
        if c == '\n' {
            while self.cursor.peek() == Some('\n') {
                self.cursor.advance();
            }
            self.skip_trivia();
            if self.cursor.peek() == Some('\n') {
                return self.lex_one();
            }
            return Token::new(TokenKind::Newline, "\n".to_string(), loc);
        }
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c == '"' {
            return self.lex_string();
        }
        if c.is_alphabetic() || c == '_' {
            let mut text = String::new();
            while let Some(c) = self.cursor.peek() {
                if c.is_alphanumeric() || c == '_' {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
            let upper = text.to_ascii_uppercase();
            if let Some(kind) = lookup_keyword(KEYWORDS, &upper) {
                return Token::new(kind, text, loc).with_canonical(upper);
            }
            return Token::new(TokenKind::Ident, text.clone(), loc).with_canonical(upper);
        }
        self.cursor.advance();
        let single = |kind| Token::new(kind, c.to_string(), loc);
        match c {
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            ',' => single(TokenKind::Comma),
            ':' => single(TokenKind::Colon),
            '.' => single(TokenKind::Dot),
            '+' => single(TokenKind::Plus),
            '-' => single(TokenKind::Minus),
            '*' => single(TokenKind::Star),
            '/' => single(TokenKind::Slash),
            '=' => single(TokenKind::Eq),
            '<' => {
                if self.cursor.bump_if('>') {
                    Token::new(TokenKind::NotEq, "<>", loc)
                } else if self.cursor.bump_if('=') {
                    Token::new(TokenKind::LtEq, "<=", loc)
                } else {
                    single(TokenKind::Lt)
                }
            }
            '>' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::GtEq, ">=", loc)
                } else {
                    single(TokenKind::Gt)
                }
            }
            other => {
                self.errors.push(LexError {
                    message: format!("unexpected character '{other}'"),
                    loc,
                });
                Token::new(TokenKind::Unknown, other.to_string(), loc)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = BasicLexer::new(src, 0);
        lexer.tokenize_all().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("if If IF"),
            vec![TokenKind::KwIf, TokenKind::KwIf, TokenKind::KwIf, TokenKind::Eof]
        );
    }

    #[test]
    fn apostrophe_starts_a_line_comment() {
        let toks = kinds("LET x = 1 ' this is ignored\nLET y = 2");
        assert_eq!(toks.iter().filter(|k| **k == TokenKind::KwLet).count(), 2);
    }

    #[test]
    fn not_equal_is_a_single_token() {
        assert_eq!(kinds("a <> b"), vec![TokenKind::Ident, TokenKind::NotEq, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn hex_and_binary_literals_parse() {
        let mut lexer = BasicLexer::new("0xFF 0b101", 0);
        let toks = lexer.tokenize_all();
        assert_eq!(toks[0].numeric_value, Some(255.0));
        assert_eq!(toks[1].numeric_value, Some(5.0));
    }

    #[test]
    fn string_escapes_are_decoded() {
        let mut lexer = BasicLexer::new("\"a\\nb\"", 0);
        let toks = lexer.tokenize_all();
        assert_eq!(toks[0].string_value.as_deref(), Some("a\nb"));
    }
}
