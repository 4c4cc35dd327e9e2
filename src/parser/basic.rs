//! Recursive-descent parser for the BASIC dialect. Statement sequencing
//! (line labels, `:`/newline separators) is centralized in
//! `StatementSequencer` so the three statement forms — a single
//! statement, a colon-separated list, and a block body — share one
//! policy instead of re-deriving it ad hoc at each call site.
use crate::ast::*;
use crate::lexer::basic::BasicLexer;
use crate::parser::{climb_binary, infix_binding_power, Prec, TokenCursor};
use crate::source::SourceLoc;
use crate::token::TokenKind;
use std::collections::HashMap;

pub fn parse<'a, 'e>(source: &str, file_id: u32, emitter: &'a mut crate::diagnostics::DiagnosticEmitter<'e>) -> Decl {
    let mut lexer = BasicLexer::new(source, file_id);
    let tokens = lexer.tokenize_all();
    for err in lexer.take_errors() {
        emitter.emit(crate::diagnostics::Severity::Error, "B0001", err.loc, 1, err.message);
    }
    let mut cur = TokenCursor::new(tokens, emitter);
    let mut seq = StatementSequencer::new();
    parse_source(&mut cur, &mut seq)
}

/// Named labels are synthesized a line number starting here, well above
/// any numeric line label a program could plausibly write by hand.
const SYNTHETIC_LABEL_BASE: i64 = 1_000_000;

/// Centralizes newline/colon handling and line-label bookkeeping so every
/// statement-sequence call site (single statement, colon list, block
/// body) shares one policy.
struct StatementSequencer {
    labels: HashMap<String, SourceLoc>,
    next_synthetic: i64,
}

impl StatementSequencer {
    fn new() -> Self {
        StatementSequencer { labels: HashMap::new(), next_synthetic: SYNTHETIC_LABEL_BASE }
    }

    /// Consumes a leading numeric line number or `name:` label at the
    /// start of a statement, if present, returning the label statement to
    /// prepend (or `None` if the statement has no label).
    fn consume_label(&mut self, cur: &mut TokenCursor) -> Option<Stmt> {
        let loc = cur.peek().loc;
        if cur.check(TokenKind::IntLiteral) {
            let tok = cur.advance();
            let id = cur.next_id();
            let line_number = tok.numeric_value.unwrap_or(0.0) as i64;
            return Some(Stmt { id, loc, kind: StmtKind::Label { name: tok.text, line_number } });
        }
        if cur.check(TokenKind::Ident) && cur.peek_at(1).kind == TokenKind::Colon {
            let name = cur.advance().text;
            cur.advance(); // ':'
            let id = cur.next_id();
            if let Some(first_loc) = self.labels.get(&name) {
                cur.emitter.emit(
                    crate::diagnostics::Severity::Error,
                    "B0101",
                    loc,
                    1,
                    format!("duplicate label '{name}', first declared at {first_loc:?}"),
                );
            } else {
                self.labels.insert(name.clone(), loc);
            }
            let line_number = self.next_synthetic;
            self.next_synthetic += 1;
            return Some(Stmt { id, loc, kind: StmtKind::Label { name, line_number } });
        }
        None
    }

    /// Skips statement separators (`:` and `Newline`) between statements.
    fn skip_separators(&self, cur: &mut TokenCursor) {
        while cur.check(TokenKind::Colon) || cur.check(TokenKind::Newline) {
            cur.advance();
        }
    }
}

fn block_end_keywords() -> &'static [TokenKind] {
    use TokenKind::*;
    &[KwEnd, KwElse, KwElseIf, KwNext, KwWend, KwLoop, Eof]
}

fn sync_points() -> &'static [TokenKind] {
    use TokenKind::*;
    &[Newline, Colon, KwEnd, KwSub, KwFunction, KwNamespace, Eof]
}

fn parse_source(cur: &mut TokenCursor, seq: &mut StatementSequencer) -> Decl {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let mut decls = Vec::new();
    seq.skip_separators(cur);
    while !cur.is_at_end() {
        decls.push(parse_top_level(cur, seq));
        seq.skip_separators(cur);
    }
    Decl::module(id, loc, decls)
}

/// `USING` must precede every declaration; track whether one has already
/// been seen so a later `USING` reports `E_NS_005`.
fn parse_top_level(cur: &mut TokenCursor, seq: &mut StatementSequencer) -> Decl {
    let loc = cur.peek().loc;
    let id = cur.next_id();
    if let Some(label) = seq.consume_label(cur) {
        return Decl { id, loc, kind: DeclKind::GlobalVar { name: label_decl_name(&label), ty: None, is_final: true, init: None } };
    }
    match cur.peek().kind {
        TokenKind::KwUsing => {
            cur.advance();
            let namespace = parse_dotted_path(cur);
            Decl { id, loc, kind: DeclKind::Using { namespace } }
        }
        TokenKind::KwNamespace => {
            cur.advance();
            let path = parse_dotted_path(cur);
            seq.skip_separators(cur);
            let mut decls = Vec::new();
            while !cur.check(TokenKind::KwEnd) && !cur.is_at_end() {
                decls.push(parse_top_level(cur, seq));
                seq.skip_separators(cur);
            }
            cur.expect(TokenKind::KwEnd, "'END'");
            cur.match_kind(TokenKind::KwNamespace);
            Decl { id, loc, kind: DeclKind::Namespace { path, decls } }
        }
        TokenKind::KwConst => {
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "constant name").text;
            cur.expect(TokenKind::Eq, "'='");
            let init = Some(parse_expr(cur));
            Decl { id, loc, kind: DeclKind::GlobalVar { name, ty: None, is_final: true, init } }
        }
        TokenKind::KwVar => {
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "variable name").text;
            let ty = if cur.match_kind(TokenKind::KwAs).is_some() { Some(parse_type(cur)) } else { None };
            let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
            Decl { id, loc, kind: DeclKind::GlobalVar { name, ty, is_final: false, init } }
        }
        TokenKind::KwSub | TokenKind::KwFunction => {
            let is_function = cur.peek().kind == TokenKind::KwFunction;
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "procedure name").text;
            let params = parse_params(cur);
            let ret = if is_function && cur.match_kind(TokenKind::KwAs).is_some() { Some(parse_type(cur)) } else { None };
            seq.skip_separators(cur);
            let body = Some(parse_block_until(cur, seq, &[TokenKind::KwEnd]));
            cur.expect(TokenKind::KwEnd, "'END'");
            cur.match_kind(if is_function { TokenKind::KwFunction } else { TokenKind::KwSub });
            let func = FunctionDeclBody { name, params, ret, body, ..Default::default() };
            Decl { id, loc, kind: DeclKind::Function(func) }
        }
        _ => {
            let stmt = parse_stmt(cur, seq);
            Decl {
                id,
                loc,
                kind: DeclKind::GlobalVar { name: String::new(), ty: None, is_final: false, init: Some(stmt_as_expr(stmt)) },
            }
        }
    }
}

fn label_decl_name(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Label { name, .. } => name.clone(),
        _ => String::new(),
    }
}

/// Top-level bare expression statements (rare outside `sub`/`function`
/// bodies) are wrapped as a throwaway initializer so the module-decl list
/// stays uniform; the lowering tier treats an unnamed `GlobalVar` with no
/// type as a top-level statement, matching how the module-init function
/// is assembled in `il`.
fn stmt_as_expr(stmt: Stmt) -> Expr {
    match stmt.kind {
        StmtKind::Expr(e) => e,
        _ => Expr { id: stmt.id, loc: stmt.loc, kind: ExprKind::UnitLiteral },
    }
}

fn parse_dotted_path(cur: &mut TokenCursor) -> String {
    let mut parts = vec![cur.expect(TokenKind::Ident, "path segment").text];
    while cur.match_kind(TokenKind::Dot).is_some() {
        parts.push(cur.expect(TokenKind::Ident, "path segment").text);
    }
    parts.join(".")
}

fn parse_params(cur: &mut TokenCursor) -> Vec<Param> {
    cur.expect(TokenKind::LParen, "'('");
    let mut params = Vec::new();
    while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
        cur.match_kind(TokenKind::KwByRef);
        cur.match_kind(TokenKind::KwByVal);
        let name = cur.expect(TokenKind::Ident, "parameter name").text;
        let ty = if cur.match_kind(TokenKind::KwAs).is_some() { Some(parse_type(cur)) } else { None };
        params.push(Param { name, ty });
        if cur.match_kind(TokenKind::Comma).is_none() {
            break;
        }
    }
    cur.expect(TokenKind::RParen, "')'");
    params
}

fn parse_type(cur: &mut TokenCursor) -> TypeNode {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let name = cur.expect(TokenKind::Ident, "type name").text;
    TypeNode { id, loc, kind: TypeNodeKind::Named(name) }
}

/// Parses statements until one of `terminators` is reached, without
/// consuming the terminator itself.
fn parse_block_until(cur: &mut TokenCursor, seq: &mut StatementSequencer, terminators: &[TokenKind]) -> Block {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let mut stmts = Vec::new();
    seq.skip_separators(cur);
    while !terminators.contains(&cur.peek().kind) && !cur.is_at_end() {
        if let Some(label) = seq.consume_label(cur) {
            stmts.push(label);
            seq.skip_separators(cur);
            continue;
        }
        stmts.push(parse_stmt(cur, seq));
        seq.skip_separators(cur);
    }
    Block { id, loc, stmts, tail: None }
}

fn parse_stmt(cur: &mut TokenCursor, seq: &mut StatementSequencer) -> Stmt {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    match cur.peek().kind {
        TokenKind::KwLet => {
            cur.advance();
            parse_assignment_or_var(cur, id, loc, false)
        }
        TokenKind::KwVar => {
            cur.advance();
            parse_assignment_or_var(cur, id, loc, true)
        }
        TokenKind::KwIf => parse_if(cur, seq, id, loc),
        TokenKind::KwWhile => {
            cur.advance();
            let cond = parse_expr(cur);
            cur.match_kind(TokenKind::Newline);
            let body = Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block_until(cur, seq, &[TokenKind::KwWend])) });
            cur.expect(TokenKind::KwWend, "'WEND'");
            Stmt { id, loc, kind: StmtKind::While { cond, body } }
        }
        TokenKind::KwDo => {
            cur.advance();
            cur.match_kind(TokenKind::Newline);
            let body = parse_block_until(cur, seq, &[TokenKind::KwLoop]);
            cur.expect(TokenKind::KwLoop, "'LOOP'");
            let cond = if cur.match_kind(TokenKind::KwWhile).is_some() { parse_expr(cur) } else { Expr { id: cur.next_id(), loc, kind: ExprKind::BoolLiteral(false) } };
            Stmt { id, loc, kind: StmtKind::While { cond, body: Box::new(Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(body) }) } }
        }
        TokenKind::KwFor => parse_for(cur, seq, id, loc),
        TokenKind::KwSelect => parse_select_case(cur, seq, id, loc),
        TokenKind::KwReturn => {
            cur.advance();
            let value = if is_stmt_terminator(cur) { None } else { Some(parse_expr(cur)) };
            Stmt { id, loc, kind: StmtKind::Return(value) }
        }
        TokenKind::KwBreak => {
            cur.advance();
            Stmt { id, loc, kind: StmtKind::Break }
        }
        TokenKind::KwContinue => {
            cur.advance();
            Stmt { id, loc, kind: StmtKind::Continue }
        }
        TokenKind::KwGoto => {
            cur.advance();
            let target = cur.expect(TokenKind::Ident, "label name").text;
            Stmt { id, loc, kind: StmtKind::Goto(target) }
        }
        TokenKind::KwGosub => {
            cur.advance();
            let target = cur.expect(TokenKind::Ident, "label name").text;
            Stmt { id, loc, kind: StmtKind::Gosub(target) }
        }
        _ => {
            let expr = parse_expr(cur);
            if let ExprKind::Ident(name) = &expr.kind {
                if !is_stmt_terminator(cur) && !cur.check(TokenKind::Eq) {
                    cur.report_error(format!("expected '(' after procedure name '{name}'"));
                }
            }
            Stmt { id, loc, kind: StmtKind::Expr(expr) }
        }
    }
}

fn is_stmt_terminator(cur: &TokenCursor) -> bool {
    matches!(cur.peek().kind, TokenKind::Colon | TokenKind::Newline | TokenKind::Eof)
        || block_end_keywords().contains(&cur.peek().kind)
}

fn parse_assignment_or_var(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc, is_dim: bool) -> Stmt {
    let name = cur.expect(TokenKind::Ident, "variable name").text;
    let ty = if cur.match_kind(TokenKind::KwAs).is_some() { Some(parse_type(cur)) } else { None };
    if is_dim {
        let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
        return Stmt { id, loc, kind: StmtKind::Var { name, ty, is_final: false, init } };
    }
    cur.expect(TokenKind::Eq, "'='");
    let rhs = parse_expr(cur);
    let assign_id = cur.next_id();
    Stmt {
        id,
        loc,
        kind: StmtKind::Expr(Expr {
            id: assign_id,
            loc,
            kind: ExprKind::Binary {
                op: BinaryOp::Eq,
                lhs: Box::new(Expr { id: cur.next_id(), loc, kind: ExprKind::Ident(name) }),
                rhs: Box::new(rhs),
            },
        }),
    }
}

fn parse_if(cur: &mut TokenCursor, seq: &mut StatementSequencer, id: NodeId, loc: SourceLoc) -> Stmt {
    cur.advance();
    let cond = parse_expr(cur);
    cur.expect(TokenKind::KwThen, "'THEN'");
    // Single-line form: `IF cond THEN stmt [ELSE stmt]` with no matching END IF.
    if !cur.check(TokenKind::Newline) {
        let then_branch = Box::new(parse_stmt(cur, seq));
        let else_branch = if cur.match_kind(TokenKind::KwElse).is_some() { Some(Box::new(parse_stmt(cur, seq))) } else { None };
        return Stmt { id, loc, kind: StmtKind::If { cond, then_branch, else_branch } };
    }
    seq.skip_separators(cur);
    let then_block = parse_block_until(cur, seq, &[TokenKind::KwElse, TokenKind::KwElseIf, TokenKind::KwEnd]);
    let then_branch = Box::new(Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(then_block) });
    let else_branch = match cur.peek().kind {
        TokenKind::KwElseIf => Some(Box::new(parse_if(cur, seq, cur.next_id(), cur.peek().loc))),
        TokenKind::KwElse => {
            cur.advance();
            seq.skip_separators(cur);
            let else_block = parse_block_until(cur, seq, &[TokenKind::KwEnd]);
            cur.expect(TokenKind::KwEnd, "'END'");
            cur.match_kind(TokenKind::KwIf);
            Some(Box::new(Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(else_block) }))
        }
        _ => {
            cur.expect(TokenKind::KwEnd, "'END'");
            cur.match_kind(TokenKind::KwIf);
            None
        }
    };
    Stmt { id, loc, kind: StmtKind::If { cond, then_branch, else_branch } }
}

fn parse_for(cur: &mut TokenCursor, seq: &mut StatementSequencer, id: NodeId, loc: SourceLoc) -> Stmt {
    cur.advance();
    let var = cur.expect(TokenKind::Ident, "loop variable").text;
    cur.expect(TokenKind::Eq, "'='");
    let start = parse_expr(cur);
    cur.expect(TokenKind::KwTo, "'TO'");
    let end = parse_expr(cur);
    let step = if cur.match_kind(TokenKind::KwStep).is_some() { Some(parse_expr(cur)) } else { None };
    seq.skip_separators(cur);
    let block = parse_block_until(cur, seq, &[TokenKind::KwNext]);
    cur.expect(TokenKind::KwNext, "'NEXT'");
    cur.match_kind(TokenKind::Ident);
    let body = Box::new(Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(block) });
    Stmt { id, loc, kind: StmtKind::For { var, start, end, step, body } }
}

/// `SELECT CASE` lowers to a chain of `If`s; BASIC's CASE-label matrix is
/// permissive about mixed literal types in one arm (an open question
/// resolved toward permissiveness — see design notes).
fn parse_select_case(cur: &mut TokenCursor, seq: &mut StatementSequencer, id: NodeId, loc: SourceLoc) -> Stmt {
    cur.advance();
    cur.expect(TokenKind::KwCase, "'CASE'");
    let scrutinee = parse_expr(cur);
    seq.skip_separators(cur);
    let mut arms: Vec<(Vec<Expr>, Block)> = Vec::new();
    let mut else_body: Option<Block> = None;
    while cur.check(TokenKind::KwCase) && !cur.is_at_end() {
        cur.advance();
        if cur.match_kind(TokenKind::KwElse).is_some() {
            seq.skip_separators(cur);
            let body = parse_block_until(cur, seq, &[TokenKind::KwCase, TokenKind::KwEnd]);
            // First CASE ELSE wins; later duplicates are diagnosed but dropped.
            if else_body.is_some() {
                cur.report_error("duplicate 'CASE ELSE'");
            } else {
                else_body = Some(body);
            }
            continue;
        }
        let mut labels = vec![parse_expr(cur)];
        while cur.match_kind(TokenKind::Comma).is_some() {
            labels.push(parse_expr(cur));
        }
        seq.skip_separators(cur);
        let body = parse_block_until(cur, seq, &[TokenKind::KwCase, TokenKind::KwEnd]);
        arms.push((labels, body));
    }
    cur.expect(TokenKind::KwEnd, "'END'");
    cur.match_kind(TokenKind::KwSelect);

    let scrutinee_id = cur.next_id();
    let mut result: Option<Stmt> = else_body.map(|b| Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(b) });
    for (labels, body) in arms.into_iter().rev() {
        let mut cond: Option<Expr> = None;
        for label in labels {
            let eq = Expr {
                id: cur.next_id(),
                loc,
                kind: ExprKind::Binary { op: BinaryOp::Eq, lhs: Box::new(clone_ident_ref(&scrutinee, scrutinee_id)), rhs: Box::new(label) },
            };
            cond = Some(match cond {
                None => eq,
                Some(prev) => Expr { id: cur.next_id(), loc, kind: ExprKind::Binary { op: BinaryOp::Or, lhs: Box::new(prev), rhs: Box::new(eq) } },
            });
        }
        let then_branch = Box::new(Stmt { id: cur.next_id(), loc, kind: StmtKind::Block(body) });
        let else_branch = result.map(Box::new);
        result = Some(Stmt { id: cur.next_id(), loc, kind: StmtKind::If { cond: cond.unwrap(), then_branch, else_branch } });
    }
    result.unwrap_or(Stmt { id, loc, kind: StmtKind::Block(Block { id, loc, stmts: Vec::new(), tail: None }) })
}

fn clone_ident_ref(scrutinee: &Expr, id: NodeId) -> Expr {
    Expr { id, loc: scrutinee.loc, kind: scrutinee.kind.clone() }
}

pub fn parse_expr(cur: &mut TokenCursor) -> Expr {
    parse_or(cur)
}

fn parse_or(cur: &mut TokenCursor) -> Expr {
    climb_binary(cur, Prec::LogicalOr, basic_binding_power, parse_unary)
}

fn basic_binding_power(kind: TokenKind) -> Option<(Prec, BinaryOp)> {
    infix_binding_power(kind)
}

fn parse_unary(cur: &mut TokenCursor) -> Expr {
    let loc = cur.peek().loc;
    let op = match cur.peek().kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::KwNot => Some(UnaryOp::Not),
        _ => None,
    };
    if let Some(op) = op {
        cur.advance();
        let operand = parse_unary(cur);
        let id = cur.next_id();
        return Expr { id, loc, kind: ExprKind::Unary { op, operand: Box::new(operand) } };
    }
    parse_postfix(cur)
}

fn parse_postfix(cur: &mut TokenCursor) -> Expr {
    let mut expr = parse_primary(cur);
    loop {
        let loc = expr.loc;
        match cur.peek().kind {
            TokenKind::LParen => {
                cur.advance();
                let mut args = Vec::new();
                while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                    args.push(Arg { name: None, value: parse_expr(cur) });
                    if cur.match_kind(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                cur.expect(TokenKind::RParen, "')'");
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Call { callee: Box::new(expr), args } };
            }
            TokenKind::Dot => {
                cur.advance();
                let name = cur.expect(TokenKind::Ident, "field name").text;
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Field { receiver: Box::new(expr), name } };
            }
            _ => break,
        }
    }
    expr
}

fn parse_primary(cur: &mut TokenCursor) -> Expr {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    match cur.peek().kind {
        TokenKind::IntLiteral => {
            let tok = cur.advance();
            Expr { id, loc, kind: ExprKind::IntLiteral(tok.numeric_value.unwrap_or(0.0) as i64) }
        }
        TokenKind::NumberLiteral => {
            let tok = cur.advance();
            Expr { id, loc, kind: ExprKind::NumberLiteral(tok.numeric_value.unwrap_or(0.0)) }
        }
        TokenKind::StringLiteral => {
            let tok = cur.advance();
            Expr { id, loc, kind: ExprKind::StringLiteral(tok.string_value.unwrap_or_default()) }
        }
        TokenKind::KwTrue => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::BoolLiteral(true) }
        }
        TokenKind::KwFalse => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::BoolLiteral(false) }
        }
        TokenKind::KwNull => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::NullLiteral }
        }
        TokenKind::KwNew => {
            cur.advance();
            let ty = parse_type(cur);
            let args = if cur.match_kind(TokenKind::LParen).is_some() {
                let mut args = Vec::new();
                while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                    args.push(Arg { name: None, value: parse_expr(cur) });
                    if cur.match_kind(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                cur.expect(TokenKind::RParen, "')'");
                args
            } else {
                Vec::new()
            };
            Expr { id, loc, kind: ExprKind::New { ty, args } }
        }
        TokenKind::LParen => {
            cur.advance();
            let inner = parse_expr(cur);
            cur.expect(TokenKind::RParen, "')'");
            inner
        }
        TokenKind::Ident => {
            let name = cur.advance().text;
            Expr { id, loc, kind: ExprKind::Ident(name) }
        }
        _ => {
            cur.report_error("expected an expression");
            cur.advance();
            Expr { id, loc, kind: ExprKind::UnitLiteral }
        }
    }
}
