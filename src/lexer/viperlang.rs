//! ViperLang lexer: case-sensitive, double-quoted strings with `${ ... }`
//! interpolation, triple-quoted verbatim strings, nested block comments.
use unescape::unescape;

use crate::lexer::{lookup_keyword, Cursor, DialectLexer, LexError};
use crate::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("abstract", TokenKind::KwAbstract),
    ("as", TokenKind::KwAs),
    ("bind", TokenKind::KwBind),
    ("break", TokenKind::KwBreak),
    ("const", TokenKind::KwConst),
    ("continue", TokenKind::KwContinue),
    ("else", TokenKind::KwElse),
    ("entity", TokenKind::KwEntity),
    ("false", TokenKind::KwFalse),
    ("final", TokenKind::KwFinalMember),
    ("fn", TokenKind::KwFn),
    ("for", TokenKind::KwFor),
    ("func", TokenKind::KwFunc),
    ("guard", TokenKind::KwGuard),
    ("if", TokenKind::KwIf),
    ("implements", TokenKind::KwImplements),
    ("import", TokenKind::KwImport),
    ("in", TokenKind::KwIn),
    ("interface", TokenKind::KwInterface),
    ("is", TokenKind::KwIs),
    ("let", TokenKind::KwLet),
    ("match", TokenKind::KwMatch),
    ("new", TokenKind::KwNew),
    ("null", TokenKind::KwNull),
    ("override", TokenKind::KwOverride),
    ("property", TokenKind::KwProperty),
    ("return", TokenKind::KwReturn),
    ("self", TokenKind::KwSelfKw),
    ("super", TokenKind::KwSuper),
    ("true", TokenKind::KwTrue),
    ("value", TokenKind::KwValue),
    ("virtual", TokenKind::KwVirtual),
    ("weak", TokenKind::KwWeak),
    ("while", TokenKind::KwWhile),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentEnd {
    Quote,
    Interpolation,
    UnterminatedEof,
}

pub struct ViperLangLexer<'a> {
    cursor: Cursor<'a>,
    errors: Vec<LexError>,
    /// Depth-of-braces-seen-so-far for each currently open `${ ... }`
    /// interpolation frame, outermost first. A `}` closes the innermost
    /// frame only when its counter is 0; otherwise it's an ordinary brace
    /// inside the interpolated expression and the counter is decremented.
    interp_stack: Vec<u32>,
}

impl<'a> ViperLangLexer<'a> {
    pub fn new(source: &'a str, file_id: u32) -> Self {
        ViperLangLexer {
            cursor: Cursor::new(source, file_id),
            errors: Vec::new(),
            interp_stack: Vec::new(),
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
                Some('/') if self.cursor.peek_at(1) == Some('*') => {
                    self.skip_nested_block_comment();
                }
                _ => break,
            }
        }
    }

    fn skip_nested_block_comment(&mut self) {
        let loc = self.cursor.loc();
        self.cursor.advance();
        self.cursor.advance();
        let mut depth = 1u32;
        while depth > 0 {
            match (self.cursor.peek(), self.cursor.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth -= 1;
                }
                (None, _) => {
                    self.errors.push(LexError {
                        message: "unterminated block comment".to_string(),
                        loc,
                    });
                    return;
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let loc = self.cursor.loc();
        if self.cursor.peek() == Some('0') && matches!(self.cursor.peek_at(1), Some('x') | Some('X')) {
            let mut text = String::new();
            text.push(self.cursor.advance().unwrap());
            text.push(self.cursor.advance().unwrap());
            while let Some(c) = self.cursor.peek() {
                if c.is_ascii_hexdigit() {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
            let value = i64::from_str_radix(&text[2..], 16).unwrap_or(0) as f64;
            return Token::new(TokenKind::IntLiteral, text, loc).with_numeric(value);
        }
        if self.cursor.peek() == Some('0') && matches!(self.cursor.peek_at(1), Some('b') | Some('B')) {
            let mut text = String::new();
            text.push(self.cursor.advance().unwrap());
            text.push(self.cursor.advance().unwrap());
            while let Some(c) = self.cursor.peek() {
                if c == '0' || c == '1' {
                    text.push(self.cursor.advance().unwrap());
                } else {
                    break;
                }
            }
            let value = i64::from_str_radix(&text[2..], 2).unwrap_or(0) as f64;
            return Token::new(TokenKind::IntLiteral, text, loc).with_numeric(value);
        }
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_digit() || c == '_' {
                let c = self.cursor.advance().unwrap();
                if c != '_' {
                    text.push(c);
                }
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

    /// Scan one literal segment of a (possibly interpolated) string, up to
    /// the terminating quote, an unescaped `${`, or EOF. `triple` strings
    /// are verbatim: no escapes, newlines allowed, terminated by `"""`.
    fn scan_segment(&mut self, triple: bool) -> (String, SegmentEnd) {
        let mut escaped = String::new();
        loop {
            if triple {
                if self.cursor.peek() == Some('"')
                    && self.cursor.peek_at(1) == Some('"')
                    && self.cursor.peek_at(2) == Some('"')
                {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.cursor.advance();
                    return (escaped, SegmentEnd::Quote);
                }
                match self.cursor.peek() {
                    None => return (escaped, SegmentEnd::UnterminatedEof),
                    Some('$') if self.cursor.peek_at(1) == Some('{') => {
                        self.cursor.advance();
                        self.cursor.advance();
                        return (escaped, SegmentEnd::Interpolation);
                    }
                    Some(c) => {
                        escaped.push(c);
                        self.cursor.advance();
                    }
                }
                continue;
            }
            match self.cursor.peek() {
                None | Some('\n') => return (resolve_escapes(&escaped), SegmentEnd::UnterminatedEof),
                Some('"') => {
                    self.cursor.advance();
                    return (resolve_escapes(&escaped), SegmentEnd::Quote);
                }
                Some('$') if self.cursor.peek_at(1) == Some('{') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    return (resolve_escapes(&escaped), SegmentEnd::Interpolation);
                }
                Some('\\') => {
                    self.cursor.advance();
                    // `${` is how this dialect escapes its own interpolation
                    // delimiter, a syntax the generic crate doesn't know.
                    match self.cursor.advance() {
                        Some('$') => escaped.push('$'),
                        Some(e) => {
                            escaped.push('\\');
                            escaped.push(e);
                        }
                        None => {}
                    }
                }
                Some(c) => {
                    escaped.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    fn begin_string(&mut self) -> Token {
        let loc = self.cursor.loc();
        let triple = self.cursor.peek() == Some('"')
            && self.cursor.peek_at(1) == Some('"')
            && self.cursor.peek_at(2) == Some('"');
        if triple {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.advance();
        } else {
            self.cursor.advance();
        }
        let (value, end) = self.scan_segment(triple);
        match end {
            SegmentEnd::Quote => Token::new(TokenKind::StringLiteral, "", loc).with_string(value),
            SegmentEnd::Interpolation => {
                self.interp_stack.push(0);
                Token::new(TokenKind::StringStart, "", loc).with_string(value)
            }
            SegmentEnd::UnterminatedEof => {
                self.errors.push(LexError {
                    message: "unterminated string literal".to_string(),
                    loc,
                });
                Token::new(TokenKind::StringLiteral, "", loc).with_string(value)
            }
        }
    }

    fn resume_string(&mut self) -> Token {
        let loc = self.cursor.loc();
        let (value, end) = self.scan_segment(false);
        match end {
            SegmentEnd::Quote => Token::new(TokenKind::StringEnd, "", loc).with_string(value),
            SegmentEnd::Interpolation => {
                self.interp_stack.push(0);
                Token::new(TokenKind::StringMid, "", loc).with_string(value)
            }
            SegmentEnd::UnterminatedEof => {
                self.errors.push(LexError {
                    message: "unterminated string literal".to_string(),
                    loc,
                });
                Token::new(TokenKind::StringEnd, "", loc).with_string(value)
            }
        }
    }
}

fn resolve_escapes(escaped: &str) -> String {
    unescape(escaped).unwrap_or_else(|| escaped.to_string())
}

impl<'a> DialectLexer for ViperLangLexer<'a> {
    fn lex_one(&mut self) -> Token {
        self.skip_trivia();
        let loc = self.cursor.loc();

        if let Some(top) = self.interp_stack.last() {
            if *top == 0 && self.cursor.peek() == Some('}') {
                self.cursor.advance();
                self.interp_stack.pop();
                return self.resume_string();
            }
        }

        let Some(c) = self.cursor.peek() else {
            return Token::eof(loc);
        };
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c == '"' {
            return self.begin_string();
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
            if let Some(kind) = lookup_keyword(KEYWORDS, &text) {
                return Token::new(kind, text, loc);
            }
            return Token::new(TokenKind::Ident, text, loc);
        }
        self.cursor.advance();
        let single = |kind| Token::new(kind, c.to_string(), loc);
        match c {
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            '{' => {
                if let Some(top) = self.interp_stack.last_mut() {
                    *top += 1;
                }
                single(TokenKind::LBrace)
            }
            '}' => {
                if let Some(top) = self.interp_stack.last_mut() {
                    *top -= 1;
                }
                single(TokenKind::RBrace)
            }
            '[' => single(TokenKind::LBracket),
            ']' => single(TokenKind::RBracket),
            ',' => single(TokenKind::Comma),
            ';' => single(TokenKind::Semicolon),
            '@' => single(TokenKind::At),
            '$' => single(TokenKind::Dollar),
            ':' => {
                if self.cursor.bump_if(':') {
                    Token::new(TokenKind::ColonColon, "::", loc)
                } else {
                    single(TokenKind::Colon)
                }
            }
            '.' => {
                if self.cursor.bump_if('.') {
                    if self.cursor.bump_if('=') {
                        Token::new(TokenKind::DotDotEq, "..=", loc)
                    } else {
                        Token::new(TokenKind::DotDot, "..", loc)
                    }
                } else {
                    single(TokenKind::Dot)
                }
            }
            '?' => {
                if self.cursor.bump_if('.') {
                    Token::new(TokenKind::QuestionDot, "?.", loc)
                } else if self.cursor.bump_if('?') {
                    Token::new(TokenKind::QuestionQuestion, "??", loc)
                } else {
                    single(TokenKind::Question)
                }
            }
            '+' => single(TokenKind::Plus),
            '-' => {
                if self.cursor.bump_if('>') {
                    Token::new(TokenKind::Arrow, "->", loc)
                } else {
                    single(TokenKind::Minus)
                }
            }
            '*' => single(TokenKind::Star),
            '/' => single(TokenKind::Slash),
            '%' => single(TokenKind::Percent),
            '^' => single(TokenKind::Caret),
            '~' => single(TokenKind::Tilde),
            '!' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::NotEq, "!=", loc)
                } else {
                    single(TokenKind::Bang)
                }
            }
            '=' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::EqEq, "==", loc)
                } else if self.cursor.bump_if('>') {
                    Token::new(TokenKind::FatArrow, "=>", loc)
                } else {
                    single(TokenKind::Eq)
                }
            }
            '<' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::LtEq, "<=", loc)
                } else if self.cursor.bump_if('<') {
                    Token::new(TokenKind::ShiftLeft, "<<", loc)
                } else {
                    single(TokenKind::Lt)
                }
            }
            '>' => {
                if self.cursor.bump_if('=') {
                    Token::new(TokenKind::GtEq, ">=", loc)
                } else if self.cursor.bump_if('>') {
                    Token::new(TokenKind::ShiftRight, ">>", loc)
                } else {
                    single(TokenKind::Gt)
                }
            }
            '&' => {
                if self.cursor.bump_if('&') {
                    Token::new(TokenKind::AmpAmp, "&&", loc)
                } else {
                    single(TokenKind::Amp)
                }
            }
            '|' => {
                if self.cursor.bump_if('|') {
                    Token::new(TokenKind::PipePipe, "||", loc)
                } else {
                    single(TokenKind::Pipe)
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
        let mut lexer = ViperLangLexer::new(src, 0);
        lexer.tokenize_all().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn identifiers_are_case_sensitive_keywords() {
        assert_eq!(kinds("let Let"), vec![TokenKind::KwLet, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn simple_interpolation_yields_three_segments() {
        let toks = kinds(r#""a${x}b""#);
        assert_eq!(
            toks,
            vec![TokenKind::StringStart, TokenKind::Ident, TokenKind::StringEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn nested_braces_inside_interpolation_do_not_close_it() {
        let toks = kinds(r#""a${ {1} }b""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StringStart,
                TokenKind::LBrace,
                TokenKind::IntLiteral,
                TokenKind::RBrace,
                TokenKind::StringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_interpolations_yield_string_mid() {
        let toks = kinds(r#""a${x}b${y}c""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StringStart,
                TokenKind::Ident,
                TokenKind::StringMid,
                TokenKind::Ident,
                TokenKind::StringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        assert_eq!(kinds("/* a /* b */ c */ let"), vec![TokenKind::KwLet, TokenKind::Eof]);
    }

    #[test]
    fn triple_quoted_string_is_verbatim() {
        let mut lexer = ViperLangLexer::new("\"\"\"a\nb\\n\"\"\"", 0);
        let toks = lexer.tokenize_all();
        assert_eq!(toks[0].string_value.as_deref(), Some("a\nb\\n"));
    }
}
