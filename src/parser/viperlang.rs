//! Recursive-descent parser for ViperLang. Precedence-climbs the full
//! ladder: assignment → ternary → range → coalesce → or → and →
//! bit-or → bit-xor → bit-and → equality → comparison → additive →
//! multiplicative → unary → postfix → primary.
use crate::ast::*;
use crate::lexer::viperlang::ViperLangLexer;
use crate::parser::{climb_binary, infix_binding_power, Prec, TokenCursor};
use crate::source::SourceLoc;
use crate::token::TokenKind;

pub fn parse_source(cur: &mut TokenCursor) -> Decl {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let mut decls = Vec::new();
    while !cur.is_at_end() {
        decls.push(parse_decl(cur));
    }
    Decl::module(id, loc, decls)
}

/// Convenience: lex `source` and drive `parse_source` over it, draining
/// lexer errors into `emitter` before parsing starts.
pub fn parse<'a, 'e>(source: &str, file_id: u32, emitter: &'a mut crate::diagnostics::DiagnosticEmitter<'e>) -> Decl {
    let mut lexer = ViperLangLexer::new(source, file_id);
    let tokens = lexer.tokenize_all();
    for err in lexer.take_errors() {
        emitter.emit(crate::diagnostics::Severity::Error, "V0001", err.loc, 1, err.message);
    }
    let mut cur = TokenCursor::new(tokens, emitter);
    parse_source(&mut cur)
}

fn sync_points() -> &'static [TokenKind] {
    use TokenKind::*;
    &[KwFunc, KwLet, KwValue, KwEntity, KwInterface, KwIf, KwWhile, KwFor, KwReturn, RBrace]
}

fn parse_decl(cur: &mut TokenCursor) -> Decl {
    let loc = cur.peek().loc;
    let id = cur.next_id();
    match cur.peek().kind {
        TokenKind::KwImport => {
            cur.advance();
            let path = parse_dotted_path(cur);
            let wildcard = cur.match_kind(TokenKind::Star).is_some();
            let alias = if cur.match_kind(TokenKind::KwAs).is_some() {
                Some(cur.expect(TokenKind::Ident, "alias name").text)
            } else {
                None
            };
            Decl { id, loc, kind: DeclKind::Import { path, alias, wildcard } }
        }
        TokenKind::KwBind => {
            cur.advance();
            let path = parse_dotted_path(cur);
            let alias = if cur.match_kind(TokenKind::KwAs).is_some() {
                Some(cur.expect(TokenKind::Ident, "alias name").text)
            } else {
                None
            };
            Decl { id, loc, kind: DeclKind::Bind { path, alias } }
        }
        TokenKind::KwValue | TokenKind::KwEntity => {
            let is_value = cur.peek().kind == TokenKind::KwValue;
            cur.advance();
            let body = parse_type_decl_body(cur);
            let kind = if is_value { DeclKind::Value(body) } else { DeclKind::Entity(body) };
            Decl { id, loc, kind }
        }
        TokenKind::KwInterface => {
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "interface name").text;
            cur.expect(TokenKind::LBrace, "'{'");
            let mut methods = Vec::new();
            while !cur.check(TokenKind::RBrace) && !cur.is_at_end() {
                methods.push(parse_function_like(cur, DeclKind::Method as fn(FunctionDeclBody) -> DeclKind, true));
            }
            cur.expect(TokenKind::RBrace, "'}'");
            Decl { id, loc, kind: DeclKind::Interface(InterfaceDeclBody { name, methods }) }
        }
        TokenKind::KwFunc => {
            cur.advance();
            Decl { id, loc, kind: parse_function_like(cur, DeclKind::Function as fn(FunctionDeclBody) -> DeclKind, false) }
        }
        TokenKind::KwLet | TokenKind::KwConst => {
            let is_final = cur.peek().kind == TokenKind::KwConst;
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "variable name").text;
            let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
            let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
            cur.match_kind(TokenKind::Semicolon);
            Decl { id, loc, kind: DeclKind::GlobalVar { name, ty, is_final, init } }
        }
        _ => {
            cur.report_error("expected a top-level declaration");
            cur.resync_after_error(sync_points());
            Decl { id, loc, kind: DeclKind::Module { decls: Vec::new() } }
        }
    }
}

fn parse_type_decl_body(cur: &mut TokenCursor) -> TypeDeclCommon {
    let name = cur.expect(TokenKind::Ident, "type name").text;
    let mut common = TypeDeclCommon { name, ..Default::default() };
    if cur.match_kind(TokenKind::KwInherits).is_some() {
        common.base = Some(cur.expect(TokenKind::Ident, "base type name").text);
    }
    if cur.match_kind(TokenKind::KwImplements).is_some() {
        loop {
            common.implements.push(cur.expect(TokenKind::Ident, "interface name").text);
            if cur.match_kind(TokenKind::Comma).is_none() {
                break;
            }
        }
    }
    if cur.match_kind(TokenKind::KwAbstract).is_some() {
        common.is_abstract = true;
    }
    cur.expect(TokenKind::LBrace, "'{'");
    while !cur.check(TokenKind::RBrace) && !cur.is_at_end() {
        let member_loc = cur.peek().loc;
        let member_id = cur.next_id();
        let is_virtual = cur.match_kind(TokenKind::KwVirtual).is_some();
        let is_abstract = cur.match_kind(TokenKind::KwAbstract).is_some();
        let is_override = cur.match_kind(TokenKind::KwOverride).is_some();
        let is_weak = cur.match_kind(TokenKind::KwWeak).is_some();
        let is_final = cur.match_kind(TokenKind::KwFinalMember).is_some();
        match cur.peek().kind {
            TokenKind::KwNew => {
                cur.advance();
                let mut body = parse_function_tail(cur);
                body.is_virtual = is_virtual;
                body.is_abstract = is_abstract;
                body.is_override = is_override;
                common.constructors.push(Decl { id: member_id, loc: member_loc, kind: DeclKind::Constructor(body) });
            }
            TokenKind::KwFunc => {
                cur.advance();
                let mut body = parse_function_like_body(cur);
                body.is_virtual = is_virtual;
                body.is_abstract = is_abstract;
                body.is_override = is_override;
                common.methods.push(Decl { id: member_id, loc: member_loc, kind: DeclKind::Method(body) });
            }
            TokenKind::KwProperty => {
                cur.advance();
                let name = cur.expect(TokenKind::Ident, "property name").text;
                cur.expect(TokenKind::Colon, "':'");
                let ty = parse_type(cur);
                cur.expect(TokenKind::LBrace, "'{'");
                let mut getter = None;
                let mut setter = None;
                while !cur.check(TokenKind::RBrace) && !cur.is_at_end() {
                    if cur.match_kind(TokenKind::KwGet).is_some() {
                        getter = Some(parse_block(cur));
                    } else if cur.match_kind(TokenKind::KwSet).is_some() {
                        setter = Some(parse_block(cur));
                    } else {
                        cur.report_error("expected 'get' or 'set'");
                        cur.resync_after_error(&[TokenKind::RBrace]);
                    }
                }
                cur.expect(TokenKind::RBrace, "'}'");
                common.properties.push(Decl {
                    id: member_id,
                    loc: member_loc,
                    kind: DeclKind::Property(PropertyDeclBody { name, ty, getter, setter }),
                });
            }
            TokenKind::Ident => {
                let name = cur.advance().text;
                cur.expect(TokenKind::Colon, "':'");
                let ty = parse_type(cur);
                cur.match_kind(TokenKind::Semicolon);
                let visibility = Visibility::Public;
                common.fields.push(Decl {
                    id: member_id,
                    loc: member_loc,
                    kind: DeclKind::Field(FieldDeclBody { name, ty, is_weak, is_final, visibility }),
                });
            }
            _ => {
                cur.report_error("expected a field, method, property, or constructor");
                cur.resync_after_error(&[TokenKind::RBrace]);
            }
        }
    }
    cur.expect(TokenKind::RBrace, "'}'");
    common
}

fn parse_function_like(cur: &mut TokenCursor, wrap: fn(FunctionDeclBody) -> DeclKind, signature_only: bool) -> DeclKind {
    cur.match_kind(TokenKind::KwFunc);
    let mut body = parse_function_like_body(cur);
    if signature_only {
        body.body = None;
    }
    wrap(body)
}

fn parse_function_like_body(cur: &mut TokenCursor) -> FunctionDeclBody {
    let name = cur.expect(TokenKind::Ident, "function name").text;
    let mut body = parse_function_tail(cur);
    body.name = name;
    body
}

fn parse_function_tail(cur: &mut TokenCursor) -> FunctionDeclBody {
    let params = parse_params(cur);
    let ret = if cur.match_kind(TokenKind::Arrow).is_some() { Some(parse_type(cur)) } else { None };
    let body = if cur.check(TokenKind::LBrace) { Some(parse_block(cur)) } else { cur.match_kind(TokenKind::Semicolon); None };
    FunctionDeclBody {
        name: String::new(),
        params,
        ret,
        body,
        is_virtual: false,
        is_abstract: false,
        is_override: false,
        is_static: false,
        visibility: None,
    }
}

fn parse_params(cur: &mut TokenCursor) -> Vec<Param> {
    cur.expect(TokenKind::LParen, "'('");
    let mut params = Vec::new();
    while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
        let name = cur.expect(TokenKind::Ident, "parameter name").text;
        let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
        params.push(Param { name, ty });
        if cur.match_kind(TokenKind::Comma).is_none() {
            break;
        }
    }
    cur.expect(TokenKind::RParen, "')'");
    params
}

fn parse_dotted_path(cur: &mut TokenCursor) -> String {
    let mut parts = vec![cur.expect(TokenKind::Ident, "path segment").text];
    while cur.match_kind(TokenKind::Dot).is_some() {
        parts.push(cur.expect(TokenKind::Ident, "path segment").text);
    }
    parts.join(".")
}

pub fn parse_type(cur: &mut TokenCursor) -> TypeNode {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let name = cur.expect(TokenKind::Ident, "type name").text;
    let mut kind = if cur.check(TokenKind::Lt) {
        cur.advance();
        let mut args = vec![parse_type(cur)];
        while cur.match_kind(TokenKind::Comma).is_some() {
            args.push(parse_type(cur));
        }
        cur.expect(TokenKind::Gt, "'>'");
        TypeNodeKind::Generic(name, args)
    } else {
        TypeNodeKind::Named(name)
    };
    if cur.match_kind(TokenKind::Question).is_some() {
        let inner = TypeNode { id, loc, kind };
        let outer_id = cur.next_id();
        kind = TypeNodeKind::Optional(Box::new(inner));
        return TypeNode { id: outer_id, loc, kind };
    }
    TypeNode { id, loc, kind }
}

fn parse_block(cur: &mut TokenCursor) -> Block {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    cur.expect(TokenKind::LBrace, "'{'");
    let mut stmts = Vec::new();
    while !cur.check(TokenKind::RBrace) && !cur.is_at_end() {
        stmts.push(parse_stmt(cur));
    }
    cur.expect(TokenKind::RBrace, "'}'");
    Block { id, loc, stmts, tail: None }
}

fn parse_stmt(cur: &mut TokenCursor) -> Stmt {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    match cur.peek().kind {
        TokenKind::LBrace => Stmt { id, loc, kind: StmtKind::Block(parse_block(cur)) },
        TokenKind::KwLet | TokenKind::KwConst => {
            let is_final = cur.peek().kind == TokenKind::KwConst;
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "variable name").text;
            let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
            let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
            cur.match_kind(TokenKind::Semicolon);
            Stmt { id, loc, kind: StmtKind::Var { name, ty, is_final, init } }
        }
        TokenKind::KwIf => {
            cur.advance();
            let cond = parse_expr(cur);
            let then_branch = Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block(cur)) });
            let else_branch = if cur.match_kind(TokenKind::KwElse).is_some() {
                if cur.check(TokenKind::KwIf) {
                    Some(Box::new(parse_stmt(cur)))
                } else {
                    Some(Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block(cur)) }))
                }
            } else {
                None
            };
            Stmt { id, loc, kind: StmtKind::If { cond, then_branch, else_branch } }
        }
        TokenKind::KwWhile => {
            cur.advance();
            let cond = parse_expr(cur);
            let body = Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block(cur)) });
            Stmt { id, loc, kind: StmtKind::While { cond, body } }
        }
        TokenKind::KwFor => {
            cur.advance();
            let var = cur.expect(TokenKind::Ident, "loop variable").text;
            cur.expect(TokenKind::KwIn, "'in'");
            let iterable = parse_expr(cur);
            let body = Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block(cur)) });
            Stmt { id, loc, kind: StmtKind::ForIn { var, iterable, body } }
        }
        TokenKind::KwGuard => {
            cur.advance();
            let cond = parse_expr(cur);
            cur.expect(TokenKind::KwElse, "'else'");
            let else_body = Box::new(Stmt { id: cur.next_id(), loc: cur.peek().loc, kind: StmtKind::Block(parse_block(cur)) });
            Stmt { id, loc, kind: StmtKind::Guard { cond, else_body } }
        }
        TokenKind::KwReturn => {
            cur.advance();
            let value = if cur.check(TokenKind::Semicolon) || cur.check(TokenKind::RBrace) { None } else { Some(parse_expr(cur)) };
            cur.match_kind(TokenKind::Semicolon);
            Stmt { id, loc, kind: StmtKind::Return(value) }
        }
        TokenKind::KwBreak => {
            cur.advance();
            cur.match_kind(TokenKind::Semicolon);
            Stmt { id, loc, kind: StmtKind::Break }
        }
        TokenKind::KwContinue => {
            cur.advance();
            cur.match_kind(TokenKind::Semicolon);
            Stmt { id, loc, kind: StmtKind::Continue }
        }
        TokenKind::KwMatch => {
            let scrutinee_loc = cur.peek().loc;
            let expr = parse_match_expr(cur, scrutinee_loc);
            cur.match_kind(TokenKind::Semicolon);
            match expr.kind {
                ExprKind::Match { scrutinee, arms } => Stmt { id, loc, kind: StmtKind::Match { scrutinee: *scrutinee, arms } },
                other => Stmt { id, loc, kind: StmtKind::Expr(Expr { id: expr.id, loc: expr.loc, kind: other }) },
            }
        }
        _ => {
            let expr = parse_expr(cur);
            cur.match_kind(TokenKind::Semicolon);
            Stmt { id, loc, kind: StmtKind::Expr(expr) }
        }
    }
}

pub fn parse_expr(cur: &mut TokenCursor) -> Expr {
    parse_assignment(cur)
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. } | ExprKind::TupleIndex { .. })
}

fn parse_assignment(cur: &mut TokenCursor) -> Expr {
    let lhs = parse_ternary(cur);
    if cur.check(TokenKind::Eq) && is_assignable(&lhs) {
        let loc = lhs.loc;
        cur.advance();
        let rhs = parse_assignment(cur);
        let id = cur.next_id();
        return Expr {
            id,
            loc,
            kind: ExprKind::Binary { op: BinaryOp::Eq, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        };
    }
    lhs
}

fn parse_ternary(cur: &mut TokenCursor) -> Expr {
    let cond = parse_range(cur);
    if cur.match_kind(TokenKind::Question).is_some() {
        let loc = cond.loc;
        let then_branch = parse_expr(cur);
        cur.expect(TokenKind::Colon, "':'");
        let else_branch = parse_expr(cur);
        let id = cur.next_id();
        return Expr {
            id,
            loc,
            kind: ExprKind::Ternary { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Box::new(else_branch) },
        };
    }
    cond
}

fn parse_range(cur: &mut TokenCursor) -> Expr {
    let start = parse_coalesce(cur);
    if cur.check(TokenKind::DotDot) || cur.check(TokenKind::DotDotEq) {
        let inclusive = cur.peek().kind == TokenKind::DotDotEq;
        let loc = start.loc;
        cur.advance();
        let end = parse_coalesce(cur);
        let id = cur.next_id();
        return Expr { id, loc, kind: ExprKind::Range { start: Box::new(start), end: Box::new(end), inclusive } };
    }
    start
}

fn parse_coalesce(cur: &mut TokenCursor) -> Expr {
    let lhs = parse_or_chain(cur);
    if cur.match_kind(TokenKind::QuestionQuestion).is_some() {
        let loc = lhs.loc;
        let rhs = parse_coalesce(cur);
        let id = cur.next_id();
        return Expr { id, loc, kind: ExprKind::Coalesce { lhs: Box::new(lhs), rhs: Box::new(rhs) } };
    }
    lhs
}

fn parse_or_chain(cur: &mut TokenCursor) -> Expr {
    climb_binary(cur, Prec::LogicalOr, infix_binding_power, parse_unary)
}

fn parse_unary(cur: &mut TokenCursor) -> Expr {
    let loc = cur.peek().loc;
    let op = match cur.peek().kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::Tilde => Some(UnaryOp::BitNot),
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
                    let name = if cur.check(TokenKind::Ident) && cur.peek_at(1).kind == TokenKind::Colon {
                        let n = cur.advance().text;
                        cur.advance();
                        Some(n)
                    } else {
                        None
                    };
                    args.push(Arg { name, value: parse_expr(cur) });
                    if cur.match_kind(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                cur.expect(TokenKind::RParen, "')'");
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Call { callee: Box::new(expr), args } };
            }
            TokenKind::LBracket => {
                cur.advance();
                let index = parse_expr(cur);
                cur.expect(TokenKind::RBracket, "']'");
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Index { receiver: Box::new(expr), index: Box::new(index) } };
            }
            TokenKind::Dot => {
                cur.advance();
                if cur.check(TokenKind::IntLiteral) {
                    let idx_tok = cur.advance();
                    let id = cur.next_id();
                    expr = Expr {
                        id,
                        loc,
                        kind: ExprKind::TupleIndex { receiver: Box::new(expr), index: idx_tok.numeric_value.unwrap_or(0.0) as u32 },
                    };
                } else {
                    let name = cur.expect(TokenKind::Ident, "field name").text;
                    let id = cur.next_id();
                    expr = Expr { id, loc, kind: ExprKind::Field { receiver: Box::new(expr), name } };
                }
            }
            TokenKind::QuestionDot => {
                cur.advance();
                let name = cur.expect(TokenKind::Ident, "field name").text;
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::OptionalChain { receiver: Box::new(expr), name } };
            }
            TokenKind::KwIs => {
                cur.advance();
                let ty = parse_type(cur);
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Is { expr: Box::new(expr), ty } };
            }
            TokenKind::KwAs => {
                cur.advance();
                let ty = parse_type(cur);
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::As { expr: Box::new(expr), ty } };
            }
            TokenKind::Bang if cur.peek_at(1).kind != TokenKind::Eq => {
                cur.advance();
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Try(Box::new(expr)) };
            }
            _ => break,
        }
    }
    expr
}

fn parse_match_expr(cur: &mut TokenCursor, loc: SourceLoc) -> Expr {
    cur.advance();
    let scrutinee = parse_expr(cur);
    cur.expect(TokenKind::LBrace, "'{'");
    let mut arms = Vec::new();
    while !cur.check(TokenKind::RBrace) && !cur.is_at_end() {
        arms.push(parse_match_arm(cur));
        cur.match_kind(TokenKind::Comma);
    }
    cur.expect(TokenKind::RBrace, "'}'");
    let id = cur.next_id();
    Expr { id, loc, kind: ExprKind::Match { scrutinee: Box::new(scrutinee), arms } }
}

fn parse_match_arm(cur: &mut TokenCursor) -> MatchArm {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let pattern = parse_pattern(cur);
    let guard = if cur.match_kind(TokenKind::KwIf).is_some() { Some(parse_expr(cur)) } else { None };
    cur.expect(TokenKind::FatArrow, "'=>'");
    let body = if cur.check(TokenKind::LBrace) {
        MatchArmBody::Block(parse_block(cur))
    } else {
        MatchArmBody::Expr(Box::new(parse_expr(cur)))
    };
    MatchArm { id, loc, pattern, guard, body }
}

fn parse_pattern(cur: &mut TokenCursor) -> Pattern {
    match cur.peek().kind {
        TokenKind::Ident if cur.peek().text == "_" => {
            cur.advance();
            Pattern::Wildcard
        }
        TokenKind::KwNull => {
            cur.advance();
            Pattern::Literal(LiteralPattern::Null)
        }
        TokenKind::KwTrue => {
            cur.advance();
            Pattern::Literal(LiteralPattern::Bool(true))
        }
        TokenKind::KwFalse => {
            cur.advance();
            Pattern::Literal(LiteralPattern::Bool(false))
        }
        TokenKind::IntLiteral => {
            let tok = cur.advance();
            Pattern::Literal(LiteralPattern::Int(tok.numeric_value.unwrap_or(0.0) as i64))
        }
        TokenKind::StringLiteral => {
            let tok = cur.advance();
            Pattern::Literal(LiteralPattern::Str(tok.string_value.unwrap_or_default()))
        }
        TokenKind::LParen => {
            cur.advance();
            let mut elems = Vec::new();
            while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                elems.push(parse_pattern(cur));
                if cur.match_kind(TokenKind::Comma).is_none() {
                    break;
                }
            }
            cur.expect(TokenKind::RParen, "')'");
            Pattern::Tuple(elems)
        }
        TokenKind::Ident => {
            let name = cur.advance().text;
            if cur.check(TokenKind::LParen) {
                cur.advance();
                let mut fields = Vec::new();
                while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                    fields.push(parse_pattern(cur));
                    if cur.match_kind(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                cur.expect(TokenKind::RParen, "')'");
                Pattern::Constructor { name, fields }
            } else {
                Pattern::Binding(name)
            }
        }
        _ => {
            cur.report_error("expected a pattern");
            Pattern::Wildcard
        }
    }
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
        TokenKind::StringStart => parse_interpolated_string(cur, id, loc),
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
        TokenKind::KwSelfKw => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::SelfExpr }
        }
        TokenKind::KwSuper => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::SuperExpr }
        }
        TokenKind::KwIf => parse_if_expr(cur, id, loc),
        TokenKind::KwMatch => parse_match_expr(cur, loc),
        TokenKind::KwNew => {
            cur.advance();
            let ty = parse_type(cur);
            cur.expect(TokenKind::LParen, "'('");
            let mut args = Vec::new();
            while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                args.push(Arg { name: None, value: parse_expr(cur) });
                if cur.match_kind(TokenKind::Comma).is_none() {
                    break;
                }
            }
            cur.expect(TokenKind::RParen, "')'");
            Expr { id, loc, kind: ExprKind::New { ty, args } }
        }
        TokenKind::KwFn | TokenKind::Pipe => parse_lambda(cur, id, loc),
        TokenKind::LBracket => {
            cur.advance();
            let mut elems = Vec::new();
            while !cur.check(TokenKind::RBracket) && !cur.is_at_end() {
                elems.push(parse_expr(cur));
                if cur.match_kind(TokenKind::Comma).is_none() {
                    break;
                }
            }
            cur.expect(TokenKind::RBracket, "']'");
            Expr { id, loc, kind: ExprKind::ListLiteral(elems) }
        }
        TokenKind::LParen => {
            cur.advance();
            if cur.check(TokenKind::RParen) {
                cur.advance();
                return Expr { id, loc, kind: ExprKind::UnitLiteral };
            }
            let first = parse_expr(cur);
            if cur.match_kind(TokenKind::Comma).is_some() {
                let mut elems = vec![first];
                while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
                    elems.push(parse_expr(cur));
                    if cur.match_kind(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                cur.expect(TokenKind::RParen, "')'");
                return Expr { id, loc, kind: ExprKind::TupleLiteral(elems) };
            }
            cur.expect(TokenKind::RParen, "')'");
            first
        }
        TokenKind::LBrace => Expr { id, loc, kind: ExprKind::Block(parse_block(cur)) },
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

fn parse_if_expr(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc) -> Expr {
    cur.advance();
    let cond = parse_expr(cur);
    let then_branch = Expr { id: cur.next_id(), loc: cur.peek().loc, kind: ExprKind::Block(parse_block(cur)) };
    let else_branch = if cur.match_kind(TokenKind::KwElse).is_some() {
        if cur.check(TokenKind::KwIf) {
            Some(Box::new(parse_primary(cur)))
        } else {
            Some(Box::new(Expr { id: cur.next_id(), loc: cur.peek().loc, kind: ExprKind::Block(parse_block(cur)) }))
        }
    } else {
        None
    };
    Expr { id, loc, kind: ExprKind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch } }
}

fn parse_lambda(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc) -> Expr {
    cur.match_kind(TokenKind::KwFn);
    cur.expect(TokenKind::Pipe, "'|'");
    let mut params = Vec::new();
    while !cur.check(TokenKind::Pipe) && !cur.is_at_end() {
        let name = cur.expect(TokenKind::Ident, "parameter name").text;
        let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
        params.push(Param { name, ty });
        if cur.match_kind(TokenKind::Comma).is_none() {
            break;
        }
    }
    cur.expect(TokenKind::Pipe, "'|'");
    let ret = if cur.match_kind(TokenKind::Arrow).is_some() { Some(parse_type(cur)) } else { None };
    let body = if cur.check(TokenKind::LBrace) {
        Expr { id: cur.next_id(), loc: cur.peek().loc, kind: ExprKind::Block(parse_block(cur)) }
    } else {
        parse_expr(cur)
    };
    Expr { id, loc, kind: ExprKind::Lambda { params, ret, body: Box::new(body) } }
}

fn parse_interpolated_string(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc) -> Expr {
    let start = cur.advance();
    let mut parts = vec![StringPart::Literal(start.string_value.unwrap_or_default())];
    loop {
        parts.push(StringPart::Expr(parse_expr(cur)));
        match cur.peek().kind {
            TokenKind::StringMid => {
                let tok = cur.advance();
                parts.push(StringPart::Literal(tok.string_value.unwrap_or_default()));
            }
            TokenKind::StringEnd => {
                let tok = cur.advance();
                parts.push(StringPart::Literal(tok.string_value.unwrap_or_default()));
                break;
            }
            _ => {
                cur.report_error("unterminated string interpolation");
                break;
            }
        }
    }
    Expr { id, loc, kind: ExprKind::InterpolatedString(parts) }
}
