//! Pascal lexer: case-insensitive everywhere, single-quoted strings,
//! `{ ... }` and `(* ... *)` block comments (not nested — classic Pascal),
//! `//` line comments as a modern extension.
use crate::lexer::{lookup_keyword, Cursor, DialectLexer, LexError};
use crate::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("ABSTRACT", TokenKind::KwAbstract),
    ("AND", TokenKind::KwAnd),
    ("ARRAY", TokenKind::KwArray),
    ("AS", TokenKind::KwAs),
    ("BEGIN", TokenKind::KwBegin),
    ("BREAK", TokenKind::KwBreak),
    ("CASE", TokenKind::KwCase),
    ("CLASS", TokenKind::KwClass),
    ("CONST", TokenKind::KwConst),
    ("CONSTRUCTOR", TokenKind::KwConstructor),
    ("CONTINUE", TokenKind::KwContinue),
    ("DESTRUCTOR", TokenKind::KwDestructor),
    ("DIV", TokenKind::KwDiv),
    ("DO", TokenKind::KwDo),
    ("DOWNTO", TokenKind::KwDownTo),
    ("ELSE", TokenKind::KwElse),
    ("END", TokenKind::KwEnd),
    ("FALSE", TokenKind::KwFalse),
    ("FINAL", TokenKind::KwFinalMember),
    ("FOR", TokenKind::KwFor),
    ("FUNCTION", TokenKind::KwFunction),
    ("IF", TokenKind::KwIf),
    ("IMPLEMENTS", TokenKind::KwImplements),
    ("INHERITS", TokenKind::KwInherits),
    ("INTERFACE", TokenKind::KwInterface),
    ("IS", TokenKind::KwIs),
    ("MOD", TokenKind::KwMod),
    ("NEW", TokenKind::KwNew),
    ("NIL", TokenKind::KwNull),
    ("NOT", TokenKind::KwNot),
    ("OF", TokenKind::KwOf),
    ("OR", TokenKind::KwOr),
    ("OVERRIDE", TokenKind::KwOverride),
    ("PROCEDURE", TokenKind::KwProcedure),
    ("PROGRAM", TokenKind::KwProgram),
    ("PROPERTY", TokenKind::KwProperty),
    ("RECORD", TokenKind::KwRecord),
    ("SELF", TokenKind::KwSelfKw),
    ("THEN", TokenKind::KwThen),
    ("TO", TokenKind::KwTo),
    ("TRUE", TokenKind::KwTrue),
    ("VAR", TokenKind::KwVar),
    ("VIRTUAL", TokenKind::KwVirtual),
    ("WEAK", TokenKind::KwWeak),
    ("WHILE", TokenKind::KwWhile),
];

pub struct PascalLexer<'a> {
    cursor: Cursor<'a>,
    errors: Vec<LexError>,
}

impl<'a> PascalLexer<'a> {
    pub fn new(source: &'a str, file_id: u32) -> Self {
        PascalLexer {
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
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_at(1) == Some('/') => {
                    while let Some(c) = self.cursor.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                Some('{') => {
                    let loc = self.cursor.loc();
                    self.cursor.advance();
                    let mut closed = false;
                    while let Some(c) = self.cursor.peek() {
                        if c == '}' {
                            self.cursor.advance();
                            closed = true;
                            break;
                        }
                        self.cursor.advance();
                    }
                    if !closed {
                        self.errors.push(LexError {
                            message: "unterminated block comment".to_string(),
                            loc,
                        });
                    }
                }
                Some('(') if self.cursor.peek_at(1) == Some('*') => {
                    let loc = self.cursor.loc();
                    self.cursor.advance();
                    self.cursor.advance();
                    let mut closed = false;
                    while !self.cursor.is_eof() {
                        if self.cursor.peek() == Some('*') && self.cursor.peek_at(1) == Some(')') {
                            self.cursor.advance();
                            self.cursor.advance();
                            closed = true;
                            break;
                        }
                        self.cursor.advance();
                    }
                    if !closed {
                        self.errors.push(LexError {
                            message: "unterminated block comment".to_string(),
                            loc,
                        });
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let loc = self.cursor.loc();
        if self.cursor.peek() == Some('$') {
            let mut text = String::new();
            text.push(self.cursor.advance().unwrap());
            while let Some(c) = self.cursor.peek() {
                if c.is_ascii_hexdigit() {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
            let value = i64::from_str_radix(&text[1..], 16).unwrap_or(0) as f64;
            return Token::new(TokenKind::IntLiteral, text, loc).with_numeric(value);
        }
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
        let value: f64 = text.parse().unwrap_or(0.0);
        Token::new(kind, text, loc).with_numeric(value)
    }

    /// Pascal strings are single-quoted; `''` inside one is an escaped
    /// literal quote (no backslash escapes).
    fn lex_string(&mut self) -> Token {
        let loc = self.cursor.loc();
        self.cursor.advance();
        let mut raw = String::from("'");
        let mut value = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    self.errors.push(LexError {
                        message: "unterminated string literal".to_string(),
                        loc,
                    });
                    break;
                }
                Some('\'') => {
                    raw.push(self.cursor.advance().unwrap());
                    if self.cursor.peek() == Some('\'') {
                        raw.push(self.cursor.advance().unwrap());
                        value.push('\'');
                        continue;
                    }
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
        Token::new(TokenKind::StringLiteral, raw, loc).with_string(value)
    }
}

impl<'a> DialectLexer for PascalLexer<'a> {
    fn lex_one(&mut self) -> Token {
        self.skip_trivia();
        let loc = self.cursor.loc();
        let Some(c) = self.cursor.peek() else {
            return Token::eof(loc);
        };
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c == '\'' {
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
            '[' => single(TokenKind::LBracket),
            ']' => single(TokenKind::RBracket),
            ',' => single(TokenKind::Comma),
            ';' => single(TokenKind::Semicolon),
            '.' => {
                if self.cursor.bump_if('.') {
                    Token::new(TokenKind::DotDot, "..", loc)
                } else {
                    single(TokenKind::Dot)
                }
            }
            '+' => single(TokenKind::Plus),
            '-' => single(TokenKind::Minus),
            '*' => single(TokenKind::Star),
            '/' => single(TokenKind::Slash),
            '^' => single(TokenKind::Caret),
            '@' => single(TokenKind::At),
            ':' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::Eq, ":=", loc)
                } else {
                    single(TokenKind::Colon)
                }
            }
            '=' => single(TokenKind::EqEq),
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
        let mut lexer = PascalLexer::new(src, 0);
        lexer.tokenize_all().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn assignment_is_a_single_token() {
        assert_eq!(kinds("x := 1"), vec![TokenKind::Ident, TokenKind::Eq, TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn brace_and_paren_star_comments_are_both_skipped() {
        assert_eq!(kinds("{ a } var (* b *) x"), vec![TokenKind::KwVar, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn doubled_single_quote_is_an_escaped_quote() {
        let mut lexer = PascalLexer::new("'it''s'", 0);
        let toks = lexer.tokenize_all();
        assert_eq!(toks[0].string_value.as_deref(), Some("it's"));
    }

    #[test]
    fn unterminated_brace_comment_is_reported() {
        let mut lexer = PascalLexer::new("{ never closes", 0);
        lexer.tokenize_all();
        assert_eq!(lexer.take_errors().len(), 1);
    }
}
