//! Recursive-descent parser for the Pascal dialect. Uses a flatter
//! precedence ladder (relation -> simple -> term -> factor -> primary)
//! rather than the full climbing table the other three dialects share.
//!
//! Token-encoding note: the lexer maps `:=` to `TokenKind::Eq` and bare
//! `=` to `TokenKind::EqEq` (the inverse of the other dialects, where
//! `Eq` is the ambiguous equals sign). Every assignment site below checks
//! `Eq`; every equality-comparison site checks `EqEq`.
use crate::ast::*;
use crate::lexer::pascal::PascalLexer;
use crate::parser::TokenCursor;
use crate::source::SourceLoc;
use crate::token::TokenKind;

pub fn parse<'a, 'e>(source: &str, file_id: u32, emitter: &'a mut crate::diagnostics::DiagnosticEmitter<'e>) -> Decl {
    let mut lexer = PascalLexer::new(source, file_id);
    let tokens = lexer.tokenize_all();
    for err in lexer.take_errors() {
        emitter.emit(crate::diagnostics::Severity::Error, "P0001", err.loc, 1, err.message);
    }
    let mut cur = TokenCursor::new(tokens, emitter);
    parse_source(&mut cur)
}

fn sync_points() -> &'static [TokenKind] {
    use TokenKind::*;
    &[Semicolon, KwEnd, KwBegin, KwProcedure, KwFunction, Eof]
}

pub fn parse_source(cur: &mut TokenCursor) -> Decl {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    let mut decls = Vec::new();
    if cur.match_kind(TokenKind::KwProgram).is_some() {
        cur.expect(TokenKind::Ident, "program name").text;
        cur.match_kind(TokenKind::Semicolon);
    }
    while !cur.check(TokenKind::KwBegin) && !cur.is_at_end() {
        decls.push(parse_decl(cur));
    }
    if cur.match_kind(TokenKind::KwBegin).is_some() {
        let main_id = cur.next_id();
        let main_loc = cur.peek().loc;
        let mut stmts = Vec::new();
        while !cur.check(TokenKind::KwEnd) && !cur.is_at_end() {
            stmts.push(parse_stmt(cur));
            cur.match_kind(TokenKind::Semicolon);
        }
        cur.expect(TokenKind::KwEnd, "'end'");
        cur.match_kind(TokenKind::Dot);
        let body = Block { id: main_id, loc: main_loc, stmts, tail: None };
        decls.push(Decl {
            id: cur.next_id(),
            loc: main_loc,
            kind: DeclKind::Function(FunctionDeclBody { name: "main".to_string(), params: Vec::new(), ret: None, body: Some(body), ..Default::default() }),
        });
    }
    Decl::module(id, loc, decls)
}

fn parse_decl(cur: &mut TokenCursor) -> Decl {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    match cur.peek().kind {
        TokenKind::KwVar | TokenKind::KwConst => {
            let is_final = cur.peek().kind == TokenKind::KwConst;
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "variable name").text;
            let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
            let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
            cur.match_kind(TokenKind::Semicolon);
            Decl { id, loc, kind: DeclKind::GlobalVar { name, ty, is_final, init } }
        }
        TokenKind::KwProcedure | TokenKind::KwFunction => parse_routine(cur, id, loc),
        TokenKind::KwClass => parse_class(cur, id, loc),
        _ => {
            cur.report_error("expected a declaration");
            cur.resync_after_error(sync_points());
            Decl { id, loc, kind: DeclKind::Module { decls: Vec::new() } }
        }
    }
}

fn parse_routine(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc) -> Decl {
    let is_function = cur.peek().kind == TokenKind::KwFunction;
    cur.advance();
    let name = cur.expect(TokenKind::Ident, "routine name").text;
    let params = parse_params(cur);
    let ret = if is_function {
        cur.expect(TokenKind::Colon, "':'");
        Some(parse_type(cur))
    } else {
        None
    };
    cur.match_kind(TokenKind::Semicolon);
    let body = if cur.check(TokenKind::KwBegin) { Some(parse_begin_end(cur)) } else { None };
    cur.match_kind(TokenKind::Semicolon);
    Decl { id, loc, kind: DeclKind::Function(FunctionDeclBody { name, params, ret, body, ..Default::default() }) }
}

fn parse_class(cur: &mut TokenCursor, id: NodeId, loc: SourceLoc) -> Decl {
    cur.advance(); // 'class'
    let name = cur.expect(TokenKind::Ident, "class name").text;
    let mut common = TypeDeclCommon { name, ..Default::default() };
    if cur.match_kind(TokenKind::KwInherits).is_some() {
        common.base = Some(cur.expect(TokenKind::Ident, "base class name").text);
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
    cur.expect(TokenKind::KwRecord, "'record'");
    while !cur.check(TokenKind::KwEnd) && !cur.is_at_end() {
        let member_id = cur.next_id();
        let member_loc = cur.peek().loc;
        let is_virtual = cur.match_kind(TokenKind::KwVirtual).is_some();
        let is_abstract = cur.match_kind(TokenKind::KwAbstract).is_some();
        let is_override = cur.match_kind(TokenKind::KwOverride).is_some();
        let is_weak = cur.match_kind(TokenKind::KwWeak).is_some();
        match cur.peek().kind {
            TokenKind::KwConstructor => {
                cur.advance();
                cur.match_kind(TokenKind::Ident);
                let params = parse_params(cur);
                cur.match_kind(TokenKind::Semicolon);
                let body = if cur.check(TokenKind::KwBegin) { Some(parse_begin_end(cur)) } else { None };
                cur.match_kind(TokenKind::Semicolon);
                common.constructors.push(Decl {
                    id: member_id,
                    loc: member_loc,
                    kind: DeclKind::Constructor(FunctionDeclBody { name: String::new(), params, ret: None, body, is_virtual, is_abstract, is_override, ..Default::default() }),
                });
            }
            TokenKind::KwProcedure | TokenKind::KwFunction => {
                let is_function = cur.peek().kind == TokenKind::KwFunction;
                cur.advance();
                let name = cur.expect(TokenKind::Ident, "method name").text;
                let params = parse_params(cur);
                let ret = if is_function {
                    cur.expect(TokenKind::Colon, "':'");
                    Some(parse_type(cur))
                } else {
                    None
                };
                cur.match_kind(TokenKind::Semicolon);
                let body = if cur.check(TokenKind::KwBegin) { Some(parse_begin_end(cur)) } else { None };
                cur.match_kind(TokenKind::Semicolon);
                common.methods.push(Decl {
                    id: member_id,
                    loc: member_loc,
                    kind: DeclKind::Method(FunctionDeclBody { name, params, ret, body, is_virtual, is_abstract, is_override, ..Default::default() }),
                });
            }
            TokenKind::Ident => {
                let name = cur.advance().text;
                cur.expect(TokenKind::Colon, "':'");
                let ty = parse_type(cur);
                cur.match_kind(TokenKind::Semicolon);
                common.fields.push(Decl {
                    id: member_id,
                    loc: member_loc,
                    kind: DeclKind::Field(FieldDeclBody { name, ty, is_weak, is_final: false, visibility: Visibility::Public }),
                });
            }
            _ => {
                cur.report_error("expected a field, method, or constructor");
                cur.resync_after_error(&[TokenKind::KwEnd, TokenKind::Semicolon]);
            }
        }
    }
    cur.expect(TokenKind::KwEnd, "'end'");
    cur.match_kind(TokenKind::Semicolon);
    Decl { id, loc, kind: DeclKind::Entity(common) }
}

fn parse_params(cur: &mut TokenCursor) -> Vec<Param> {
    let mut params = Vec::new();
    if cur.match_kind(TokenKind::LParen).is_none() {
        return params;
    }
    while !cur.check(TokenKind::RParen) && !cur.is_at_end() {
        let name = cur.expect(TokenKind::Ident, "parameter name").text;
        let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
        params.push(Param { name, ty });
        if cur.match_kind(TokenKind::Semicolon).is_none() && cur.match_kind(TokenKind::Comma).is_none() {
            break;
        }
    }
    cur.expect(TokenKind::RParen, "')'");
    params
}

fn parse_type(cur: &mut TokenCursor) -> TypeNode {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    if cur.match_kind(TokenKind::KwArray).is_some() {
        cur.expect(TokenKind::KwOf, "'of'");
        let elem = parse_type(cur);
        return TypeNode { id, loc, kind: TypeNodeKind::Generic("Array".to_string(), vec![elem]) };
    }
    let name = cur.expect(TokenKind::Ident, "type name").text;
    TypeNode { id, loc, kind: TypeNodeKind::Named(name) }
}

fn parse_begin_end(cur: &mut TokenCursor) -> Block {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    cur.expect(TokenKind::KwBegin, "'begin'");
    let mut stmts = Vec::new();
    while !cur.check(TokenKind::KwEnd) && !cur.is_at_end() {
        stmts.push(parse_stmt(cur));
        cur.match_kind(TokenKind::Semicolon);
    }
    cur.expect(TokenKind::KwEnd, "'end'");
    Block { id, loc, stmts, tail: None }
}

fn parse_stmt(cur: &mut TokenCursor) -> Stmt {
    let id = cur.next_id();
    let loc = cur.peek().loc;
    match cur.peek().kind {
        TokenKind::KwBegin => Stmt { id, loc, kind: StmtKind::Block(parse_begin_end(cur)) },
        TokenKind::KwVar => {
            cur.advance();
            let name = cur.expect(TokenKind::Ident, "variable name").text;
            let ty = if cur.match_kind(TokenKind::Colon).is_some() { Some(parse_type(cur)) } else { None };
            let init = if cur.match_kind(TokenKind::Eq).is_some() { Some(parse_expr(cur)) } else { None };
            Stmt { id, loc, kind: StmtKind::Var { name, ty, is_final: false, init } }
        }
        TokenKind::KwIf => {
            cur.advance();
            let cond = parse_expr(cur);
            cur.expect(TokenKind::KwThen, "'then'");
            let then_branch = Box::new(parse_stmt(cur));
            let else_branch = if cur.match_kind(TokenKind::KwElse).is_some() { Some(Box::new(parse_stmt(cur))) } else { None };
            Stmt { id, loc, kind: StmtKind::If { cond, then_branch, else_branch } }
        }
        TokenKind::KwWhile => {
            cur.advance();
            let cond = parse_expr(cur);
            cur.expect(TokenKind::KwDo, "'do'");
            let body = Box::new(parse_stmt(cur));
            Stmt { id, loc, kind: StmtKind::While { cond, body } }
        }
        TokenKind::KwFor => {
            cur.advance();
            let var = cur.expect(TokenKind::Ident, "loop variable").text;
            cur.expect(TokenKind::Eq, "':='");
            let start = parse_expr(cur);
            let step = if cur.match_kind(TokenKind::KwTo).is_some() {
                None
            } else {
                cur.expect(TokenKind::KwDownTo, "'to' or 'downto'");
                Some(Expr { id: cur.next_id(), loc, kind: ExprKind::IntLiteral(-1) })
            };
            let end = parse_expr(cur);
            cur.expect(TokenKind::KwDo, "'do'");
            let body = Box::new(parse_stmt(cur));
            Stmt { id, loc, kind: StmtKind::For { var, start, end, step, body } }
        }
        TokenKind::KwBreak => {
            cur.advance();
            Stmt { id, loc, kind: StmtKind::Break }
        }
        TokenKind::KwContinue => {
            cur.advance();
            Stmt { id, loc, kind: StmtKind::Continue }
        }
        _ => {
            let expr = parse_expr(cur);
            Stmt { id, loc, kind: StmtKind::Expr(expr) }
        }
    }
}

pub fn parse_expr(cur: &mut TokenCursor) -> Expr {
    parse_assignment(cur)
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. })
}

fn parse_assignment(cur: &mut TokenCursor) -> Expr {
    let lhs = parse_relation(cur);
    if cur.check(TokenKind::Eq) && is_assignable(&lhs) {
        let loc = lhs.loc;
        cur.advance();
        let rhs = parse_assignment(cur);
        let id = cur.next_id();
        return Expr { id, loc, kind: ExprKind::Binary { op: BinaryOp::Eq, lhs: Box::new(lhs), rhs: Box::new(rhs) } };
    }
    lhs
}

fn parse_relation(cur: &mut TokenCursor) -> Expr {
    let lhs = parse_simple(cur);
    let op = match cur.peek().kind {
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::KwIs => {
            cur.advance();
            let ty = parse_type(cur);
            let id = cur.next_id();
            return Expr { id, loc: lhs.loc, kind: ExprKind::Is { expr: Box::new(lhs), ty } };
        }
        _ => None,
    };
    if let Some(op) = op {
        let loc = lhs.loc;
        cur.advance();
        let rhs = parse_simple(cur);
        let id = cur.next_id();
        return Expr { id, loc, kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) } };
    }
    lhs
}

fn parse_simple(cur: &mut TokenCursor) -> Expr {
    let mut lhs = parse_term(cur);
    loop {
        let op = match cur.peek().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::KwOr => BinaryOp::Or,
            _ => break,
        };
        let loc = lhs.loc;
        cur.advance();
        let rhs = parse_term(cur);
        let id = cur.next_id();
        lhs = Expr { id, loc, kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) } };
    }
    lhs
}

fn parse_term(cur: &mut TokenCursor) -> Expr {
    let mut lhs = parse_factor(cur);
    loop {
        let op = match cur.peek().kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::KwDiv => BinaryOp::IntDiv,
            TokenKind::KwMod => BinaryOp::Mod,
            TokenKind::KwAnd => BinaryOp::And,
            _ => break,
        };
        let loc = lhs.loc;
        cur.advance();
        let rhs = parse_factor(cur);
        let id = cur.next_id();
        lhs = Expr { id, loc, kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) } };
    }
    lhs
}

fn parse_factor(cur: &mut TokenCursor) -> Expr {
    let loc = cur.peek().loc;
    let op = match cur.peek().kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::KwNot => Some(UnaryOp::Not),
        _ => None,
    };
    if let Some(op) = op {
        cur.advance();
        let operand = parse_factor(cur);
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
            TokenKind::LBracket => {
                cur.advance();
                let index = parse_expr(cur);
                cur.expect(TokenKind::RBracket, "']'");
                let id = cur.next_id();
                expr = Expr { id, loc, kind: ExprKind::Index { receiver: Box::new(expr), index: Box::new(index) } };
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
        TokenKind::KwSelfKw => {
            cur.advance();
            Expr { id, loc, kind: ExprKind::SelfExpr }
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
