//! Shared parser primitives: a token cursor with the `peek`/`advance`/
//! `check`/`match`/`expect` contract, error-recovery resync, and Zia's
//! RAII speculation scope.
pub mod basic;
pub mod pascal;
pub mod viperlang;
pub mod zia;

use crate::ast::NodeIdGen;
use crate::diagnostics::{DiagnosticEmitter, Severity};
use crate::token::{Token, TokenKind};

/// Wraps a fully-lexed token stream (dialect lexers are run to completion
/// up front; none of the four grammars need streaming lexing). Bounds
/// checking degrades to repeating the final `Eof` token.
pub struct TokenCursor<'a, 'e> {
    tokens: Vec<Token>,
    pos: usize,
    pub emitter: &'a mut DiagnosticEmitter<'e>,
    pub ids: NodeIdGen,
    /// Set once a parse error has been reported, until `resync_after_error`
    /// clears it; suppresses cascades of near-duplicate diagnostics.
    error_sticky: bool,
}

impl<'a, 'e> TokenCursor<'a, 'e> {
    pub fn new(tokens: Vec<Token>, emitter: &'a mut DiagnosticEmitter<'e>) -> Self {
        TokenCursor {
            tokens,
            pos: 0,
            emitter,
            ids: NodeIdGen::new(),
            error_sticky: false,
        }
    }

    pub fn next_id(&self) -> crate::ast::NodeId {
        self.ids.next()
    }

    fn at(&self, idx: usize) -> &Token {
        self.tokens.get(idx).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub fn peek_at(&self, offset: usize) -> &Token {
        self.at((self.pos + offset).min(self.tokens.len().saturating_sub(1)))
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.at(self.pos).clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub fn expect(&mut self, kind: TokenKind, description: &str) -> Token {
        if self.check(kind) {
            self.advance()
        } else {
            let got = self.peek().clone();
            self.report_error(format!("expected {description}, got '{}'", got.text));
            got
        }
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        let loc = self.peek().loc;
        if self.error_sticky {
            return;
        }
        self.error_sticky = true;
        self.emitter.emit(Severity::Error, "", loc, 1, message);
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Skip tokens until a stable synchronization point: a statement
    /// terminator, a block-opening keyword, an end-of-block keyword, or
    /// EOF. Clears the error-sticky flag so the next real error is reported.
    pub fn resync_after_error(&mut self, stop_kinds: &[TokenKind]) {
        self.error_sticky = false;
        while !self.is_at_end() {
            let kind = self.peek().kind;
            if stop_kinds.contains(&kind) {
                return;
            }
            self.advance();
        }
    }
}

/// RAII speculation scope (Zia): saves `(position, error_sticky)` on
/// entry and, unless `commit()` is called, restores both on drop —
/// bounded backtracking used to disambiguate patterns from expressions.
/// Diagnostics reported while speculating are suppressed by temporarily
/// swapping in a scratch `DiagnosticEngine`.
pub struct Speculation {
    saved_pos: usize,
    saved_sticky: bool,
    committed: bool,
}

impl Speculation {
    pub fn enter(cur: &TokenCursor) -> Self {
        Speculation {
            saved_pos: cur.pos,
            saved_sticky: cur.error_sticky,
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }

    pub fn rollback(self, cur: &mut TokenCursor) {
        cur.pos = self.saved_pos;
        cur.error_sticky = self.saved_sticky;
    }
}

/// Standard binary operator precedence levels shared by ViperLang/Zia/BASIC
/// (Pascal uses the flatter ladder coded directly in `parser::pascal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    Assignment,
    Ternary,
    Range,
    Coalesce,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Comparison,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
    Primary,
}

impl Prec {
    pub fn next(self) -> Prec {
        use Prec::*;
        match self {
            Assignment => Ternary,
            Ternary => Range,
            Range => Coalesce,
            Coalesce => LogicalOr,
            LogicalOr => LogicalAnd,
            LogicalAnd => BitOr,
            BitOr => BitXor,
            BitXor => BitAnd,
            BitAnd => Equality,
            Equality => Comparison,
            Comparison => Additive,
            Additive => Multiplicative,
            Multiplicative => Unary,
            Unary => Postfix,
            Postfix => Primary,
            Primary => Primary,
        }
    }
}

pub fn infix_binding_power(kind: TokenKind) -> Option<(Prec, crate::ast::BinaryOp)> {
    use crate::ast::BinaryOp::*;
    use TokenKind::*;
    Some(match kind {
        PipePipe | KwOr => (Prec::LogicalOr, Or),
        AmpAmp | KwAnd => (Prec::LogicalAnd, And),
        Pipe => (Prec::BitOr, BitOr),
        Caret => (Prec::BitXor, BitXor),
        Amp => (Prec::BitAnd, BitAnd),
        EqEq | Eq => (Prec::Equality, Eq),
        NotEq => (Prec::Equality, NotEq),
        Lt => (Prec::Comparison, Lt),
        Gt => (Prec::Comparison, Gt),
        LtEq => (Prec::Comparison, LtEq),
        GtEq => (Prec::Comparison, GtEq),
        Plus => (Prec::Additive, Add),
        Minus => (Prec::Additive, Sub),
        Star => (Prec::Multiplicative, Mul),
        Slash => (Prec::Multiplicative, Div),
        Percent | KwMod => (Prec::Multiplicative, Mod),
        KwDiv => (Prec::Multiplicative, IntDiv),
        ShiftLeft => (Prec::Multiplicative, Shl),
        ShiftRight => (Prec::Multiplicative, Shr),
        _ => return None,
    })
}

/// Precedence-climbing loop shared by every dialect's binary-operator
/// tier. `parse_unary` handles everything tighter than the binary ladder
/// (unary prefix, postfix chains, primaries); `table` supplies the
/// dialect's operator-to-precedence mapping (Pascal's flatter ladder uses
/// its own table; the others use `infix_binding_power`).
pub fn climb_binary(
    cur: &mut TokenCursor,
    min_prec: Prec,
    table: fn(TokenKind) -> Option<(Prec, crate::ast::BinaryOp)>,
    parse_unary: fn(&mut TokenCursor) -> crate::ast::Expr,
) -> crate::ast::Expr {
    use crate::ast::{Expr, ExprKind};

    let mut lhs = parse_unary(cur);
    loop {
        let Some((prec, op)) = table(cur.peek().kind) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        let loc = lhs.loc;
        cur.advance();
        let rhs = climb_binary(cur, prec.next(), table, parse_unary);
        let id = cur.next_id();
        lhs = Expr {
            id,
            loc,
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        };
    }
    lhs
}
