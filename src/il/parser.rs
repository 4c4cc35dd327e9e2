//! Text parser for the IL module format. Unlike the four dialect
//! parsers, this one has no source-language frontend to lean on — its
//! grammar is small enough to tokenize and parse in one pass over a
//! private token vector rather than reusing `Lookahead`/`DialectLexer`,
//! which are shaped around interpolated strings and expression precedence
//! this format doesn't have.
use log::trace;

use crate::diagnostics::{Diagnostic, DiagnosticEmitter, Severity};
use crate::il::{Block, CallingConv, Extern, Function, IlType, Instr, Module, Operand, Param};
use crate::lexer::Cursor;
use crate::source::SourceLoc;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    At(String),
    Percent(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// A raw, whitespace-delimited word, used only for version strings
    /// (`0.2.0`) that don't fit the number or identifier grammars.
    Word(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Arrow,
    Eq,
    Eof,
}

#[derive(Debug, Clone)]
struct Lexed {
    tok: Tok,
    line: u32,
}

/// Tokenizes the entire input up front. The format has no nested lexing
/// contexts (no interpolated strings, no dialect keywords), so there is
/// nothing to gain from lazy/streaming tokenization here.
fn tokenize(source: &str, file_id: u32) -> Vec<Lexed> {
    let mut cur = Cursor::new(source, file_id);
    let mut out = Vec::new();
    loop {
        skip_trivia(&mut cur);
        let line = cur.loc().line;
        let Some(c) = cur.peek() else {
            out.push(Lexed { tok: Tok::Eof, line });
            break;
        };
        let tok = match c {
            '(' => {
                cur.advance();
                Tok::LParen
            }
            ')' => {
                cur.advance();
                Tok::RParen
            }
            '{' => {
                cur.advance();
                Tok::LBrace
            }
            '}' => {
                cur.advance();
                Tok::RBrace
            }
            ',' => {
                cur.advance();
                Tok::Comma
            }
            ':' => {
                cur.advance();
                Tok::Colon
            }
            '=' => {
                cur.advance();
                Tok::Eq
            }
            '-' if cur.peek_at(1) == Some('>') => {
                cur.advance();
                cur.advance();
                Tok::Arrow
            }
            '@' => {
                cur.advance();
                Tok::At(scan_name(&mut cur))
            }
            '%' => {
                cur.advance();
                Tok::Percent(scan_name(&mut cur))
            }
            '"' => Tok::Str(scan_string(&mut cur)),
            c if c.is_ascii_digit() || (c == '-' && cur.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                scan_number_or_word(&mut cur)
            }
            c if is_ident_start(c) => Tok::Ident(scan_name(&mut cur)),
            other => {
                cur.advance();
                Tok::Word(other.to_string())
            }
        };
        out.push(Lexed { tok, line });
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn skip_trivia(cur: &mut Cursor) {
    loop {
        match cur.peek() {
            Some(c) if c.is_whitespace() => {
                cur.advance();
            }
            Some(';') => {
                while let Some(c) = cur.peek() {
                    if c == '\n' {
                        break;
                    }
                    cur.advance();
                }
            }
            _ => break,
        }
    }
}

fn scan_name(cur: &mut Cursor) -> String {
    let mut s = String::new();
    while let Some(c) = cur.peek() {
        if is_ident_continue(c) {
            s.push(c);
            cur.advance();
        } else {
            break;
        }
    }
    s
}

fn scan_string(cur: &mut Cursor) -> String {
    cur.advance();
    let mut s = String::new();
    while let Some(c) = cur.peek() {
        if c == '"' {
            cur.advance();
            break;
        }
        if c == '\\' {
            cur.advance();
            if let Some(esc) = cur.peek() {
                s.push(match esc {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                cur.advance();
            }
            continue;
        }
        s.push(c);
        cur.advance();
    }
    s
}

/// A leading digit (or `-digit`) may be an int, a float, or a raw
/// version-like word (`0.2.0`, two dots). Numbers win unless the run has
/// more than one `.`, in which case the whole run is re-read as a `Word`.
fn scan_number_or_word(cur: &mut Cursor) -> Tok {
    let mut s = String::new();
    if cur.peek() == Some('-') {
        s.push('-');
        cur.advance();
    }
    let mut dots = 0;
    while let Some(c) = cur.peek() {
        if c.is_ascii_digit() {
            s.push(c);
            cur.advance();
        } else if c == '.' {
            dots += 1;
            s.push(c);
            cur.advance();
        } else if is_ident_continue(c) {
            dots += 2; // force Word classification (e.g. a trailing suffix)
            s.push(c);
            cur.advance();
        } else {
            break;
        }
    }
    match dots {
        0 => s.parse::<i64>().map(Tok::Int).unwrap_or(Tok::Word(s)),
        1 => s.parse::<f64>().map(Tok::Float).unwrap_or(Tok::Word(s)),
        _ => Tok::Word(s),
    }
}

struct Parser<'e, 'a> {
    toks: Vec<Lexed>,
    pos: usize,
    file_id: u32,
    emitter: &'e mut DiagnosticEmitter<'a>,
}

impl<'e, 'a> Parser<'e, 'a> {
    fn loc(&self, line: u32) -> SourceLoc {
        SourceLoc::new(self.file_id, line, 1)
    }

    fn cur_line(&self) -> u32 {
        self.toks[self.pos].line
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn bump(&mut self) -> Tok {
        let t = self.toks[self.pos].tok.clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Tok::Eof)
    }

    fn fatal(&mut self, code: &str, message: impl Into<String>) -> Diagnostic {
        let line = self.cur_line();
        let diag = Diagnostic::new(Severity::Error, code, self.loc(line), 1, message);
        self.emitter.emit(diag.severity, diag.code.clone(), diag.primary_loc, diag.length, diag.message.clone());
        diag
    }

    fn recoverable(&mut self, code: &str, line: u32, message: impl Into<String>) {
        self.emitter.emit(Severity::Error, code, self.loc(line), 1, message);
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<(), Diagnostic> {
        if *self.peek() == tok {
            self.bump();
            Ok(())
        } else {
            let got = describe(self.peek());
            Err(self.fatal("IL0001", format!("expected {what}, got {got}")))
        }
    }

    fn parse_module(&mut self) -> Result<Module, Diagnostic> {
        let mut module = Module::default();
        let mut seen_version = false;
        let mut seen_target = false;

        loop {
            match self.peek().clone() {
                Tok::Eof => break,
                Tok::Ident(kw) if kw == "il" => {
                    let line = self.cur_line();
                    self.bump();
                    let version = match self.bump() {
                        Tok::Word(w) => w,
                        Tok::Int(i) => i.to_string(),
                        Tok::Float(f) => f.to_string(),
                        other => return Err(self.fatal("IL0002", format!("expected a version string, got {}", describe(&other)))),
                    };
                    if seen_version {
                        self.recoverable("IL0003", line, "duplicate 'il' version directive");
                    } else {
                        module.version = version;
                        seen_version = true;
                    }
                }
                Tok::Ident(kw) if kw == "target" => {
                    let line = self.cur_line();
                    self.bump();
                    let triple = match self.bump() {
                        Tok::Str(s) => s,
                        other => return Err(self.fatal("IL0004", format!("expected a quoted target triple, got {}", describe(&other)))),
                    };
                    if self.cur_line() == line && matches!(self.peek(), Tok::Str(_) | Tok::Word(_) | Tok::Ident(_)) {
                        return Err(self.fatal("IL0005", "unexpected trailing text after target triple"));
                    }
                    if seen_target {
                        self.recoverable("IL0006", line, "duplicate 'target' directive");
                    } else {
                        module.target = Some(triple);
                        seen_target = true;
                    }
                }
                Tok::Ident(kw) if kw == "extern" => {
                    self.bump();
                    let ext = self.parse_extern()?;
                    module.externs.push(ext);
                }
                Tok::Ident(kw) if kw == "func" => {
                    self.bump();
                    let func = self.parse_function()?;
                    module.functions.push(func);
                }
                other => {
                    return Err(self.fatal("IL0007", format!("expected 'il', 'target', 'extern' or 'func', got {}", describe(&other))));
                }
            }
        }

        if !seen_version {
            self.recoverable("IL0008", 1, "missing 'il' version directive");
        }
        Ok(module)
    }

    /// Consumes an optional calling-convention keyword token preceding the
    /// `@name`. Anything other than a recognized convention or an
    /// immediate `@` is the "unknown calling convention" diagnostic.
    fn parse_calling_conv(&mut self) -> CallingConv {
        if let Tok::Ident(word) = self.peek().clone() {
            let line = self.cur_line();
            self.bump();
            match CallingConv::from_token(&word) {
                Some(cc) => cc,
                None => {
                    self.recoverable("IL0009", line, format!("unknown calling convention '{word}'"));
                    CallingConv::Ccc
                }
            }
        } else {
            CallingConv::Ccc
        }
    }

    fn parse_extern(&mut self) -> Result<Extern, Diagnostic> {
        let calling_conv = self.parse_calling_conv();
        let name = match self.bump() {
            Tok::At(n) => n,
            other => return Err(self.fatal("IL0010", format!("missing extern name (expected '@name', got {})", describe(&other)))),
        };
        if *self.peek() != Tok::LParen {
            return Err(self.fatal("IL0011", "missing '(' in extern declaration"));
        }
        self.bump();
        let mut params = Vec::new();
        if *self.peek() != Tok::RParen {
            loop {
                if matches!(self.peek(), Tok::Comma | Tok::RParen) {
                    return Err(self.fatal("IL0012", "malformed extern parameter list: empty entry"));
                }
                params.push(self.parse_type()?);
                if *self.peek() == Tok::Comma {
                    self.bump();
                    if *self.peek() == Tok::RParen {
                        return Err(self.fatal("IL0012", "malformed extern parameter list: empty entry"));
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(Tok::RParen, "')'")?;
        self.expect(Tok::Arrow, "'->'")?;
        let ret_type = self.parse_type()?;
        Ok(Extern { name, calling_conv, params, ret_type })
    }

    fn parse_type(&mut self) -> Result<IlType, Diagnostic> {
        match self.bump() {
            Tok::Ident(name) => Ok(match name.as_str() {
                "i1" => IlType::I1,
                "i32" => IlType::I32,
                "i64" => IlType::I64,
                "f64" => IlType::F64,
                "ptr" => IlType::Ptr,
                "void" => IlType::Void,
                other => IlType::Named(other.to_string()),
            }),
            other => Err(self.fatal("IL0013", format!("expected a type, got {}", describe(&other)))),
        }
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, Diagnostic> {
        let mut params = Vec::new();
        let mut seen = std::collections::HashSet::new();
        if *self.peek() != Tok::RParen {
            loop {
                if matches!(self.peek(), Tok::Comma | Tok::RParen) {
                    return Err(self.fatal("IL0012", "empty parameter slot"));
                }
                let ty = self.parse_type()?;
                let line = self.cur_line();
                let name = match self.bump() {
                    Tok::Percent(n) => n,
                    other => return Err(self.fatal("IL0014", format!("expected a '%'-prefixed parameter name, got {}", describe(&other)))),
                };
                if !seen.insert(name.clone()) {
                    self.recoverable("IL0015", line, format!("duplicate parameter name '%{name}'"));
                } else {
                    params.push(Param { ty, name });
                }
                if *self.peek() == Tok::Comma {
                    self.bump();
                    if *self.peek() == Tok::RParen {
                        return Err(self.fatal("IL0012", "empty parameter slot"));
                    }
                } else {
                    break;
                }
            }
        }
        Ok(params)
    }

    fn parse_function(&mut self) -> Result<Function, Diagnostic> {
        let calling_conv = self.parse_calling_conv();
        let name = match self.bump() {
            Tok::At(n) => n,
            other => return Err(self.fatal("IL0016", format!("missing function name (expected '@name', got {})", describe(&other)))),
        };
        self.expect(Tok::LParen, "'('")?;
        let params = self.parse_param_list()?;
        self.expect(Tok::RParen, "')'")?;
        self.expect(Tok::Arrow, "'->'")?;
        let ret_type = self.parse_type()?;
        self.expect(Tok::LBrace, "'{'")?;

        let mut blocks = Vec::new();
        let mut labels_seen = std::collections::HashSet::new();
        loop {
            if self.at_eof() {
                return Err(self.fatal("IL0017", "unexpected end of file; missing '}'"));
            }
            if *self.peek() == Tok::RBrace {
                self.bump();
                break;
            }
            let block = self.parse_block()?;
            if !labels_seen.insert(block.label.clone()) {
                self.recoverable("IL0018", block.line, format!("duplicate block '{}'", block.label));
            } else {
                blocks.push(block);
            }
        }

        for block in &blocks {
            for instr in &block.instructions {
                for target in instr.branch_targets() {
                    if !blocks.iter().any(|b| b.label == target) {
                        self.recoverable("IL0019", instr.line, format!("unknown block '{target}'"));
                    }
                }
            }
        }

        Ok(Function { name, calling_conv, params, ret_type, blocks })
    }

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let line = self.cur_line();
        let label = match self.bump() {
            Tok::Ident(n) => n,
            other => return Err(self.fatal("IL0020", format!("missing block label, got {}", describe(&other)))),
        };
        let mut params = Vec::new();
        if *self.peek() == Tok::LParen {
            self.bump();
            params = self.parse_param_list()?;
            self.expect(Tok::RParen, "')'")?;
        }
        self.expect(Tok::Colon, "':'")?;

        let mut instructions = Vec::new();
        let mut ssa_names = std::collections::HashSet::new();
        loop {
            if matches!(self.peek(), Tok::RBrace | Tok::Eof) {
                break;
            }
            if self.looks_like_block_header() {
                break;
            }
            let instr = self.parse_instruction()?;
            if let Some(name) = &instr.result {
                if !ssa_names.insert(name.clone()) {
                    self.recoverable("IL0021", instr.line, format!("duplicate SSA result name '%{name}'"));
                }
            }
            instructions.push(instr);
        }
        Ok(Block { label, params, instructions, line })
    }

    fn parse_instruction(&mut self) -> Result<Instr, Diagnostic> {
        let line = self.cur_line();
        let mut result = None;
        if let Tok::Percent(name) = self.peek().clone() {
            // Lookahead for `%name =`; otherwise a bare `%name` would only
            // ever appear as an operand, never to open an instruction.
            if matches!(self.toks.get(self.pos + 1).map(|l| &l.tok), Some(Tok::Eq)) {
                self.bump();
                self.bump();
                result = Some(name);
            }
        }
        let opcode = match self.bump() {
            Tok::Ident(op) => op,
            other => return Err(self.fatal("IL0022", format!("expected an instruction opcode, got {}", describe(&other)))),
        };
        let operands = self.parse_operands(&opcode, line)?;
        trace!("parsed '{opcode}' at line {line}");
        Ok(Instr { result, opcode, operands, line })
    }

    /// `call` is the one opcode with a parenthesized argument list;
    /// everything else is a flat, comma-separated operand list. Instructions
    /// are line-oriented, so an operand list always ends at the first
    /// token that starts a new source line.
    fn parse_operands(&mut self, opcode: &str, instr_line: u32) -> Result<Vec<Operand>, Diagnostic> {
        let mut operands = Vec::new();
        if opcode == "call" {
            operands.push(Operand::Type(self.parse_type()?));
            let callee = match self.bump() {
                Tok::At(n) => Operand::Global(n),
                other => return Err(self.fatal("IL0023", format!("expected a callee '@name', got {}", describe(&other)))),
            };
            operands.push(callee);
            self.expect(Tok::LParen, "'(' before call arguments")?;
            if *self.peek() != Tok::RParen {
                loop {
                    operands.push(self.parse_operand()?);
                    if *self.peek() == Tok::Comma {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            self.expect(Tok::RParen, "')' after call arguments")?;
            if self.cur_line() == instr_line && !matches!(self.peek(), Tok::RBrace | Tok::Eof) && !self.looks_like_block_header() {
                return Err(self.fatal("IL0024", "malformed call: trailing tokens after argument list"));
            }
            return Ok(operands);
        }

        while !self.at_instruction_boundary(instr_line) {
            operands.push(self.parse_operand()?);
            if *self.peek() == Tok::Comma {
                self.bump();
            } else {
                break;
            }
        }
        Ok(operands)
    }

    fn at_instruction_boundary(&self, instr_line: u32) -> bool {
        matches!(self.peek(), Tok::RBrace | Tok::Eof) || self.cur_line() != instr_line
    }

    /// True if the tokens at the current position form `ident[(...)]:`,
    /// the shape of a block header. Used to tell a block header apart from
    /// the next instruction when scanning ends a block's instruction list.
    fn looks_like_block_header(&self) -> bool {
        let mut i = self.pos;
        if !matches!(self.toks.get(i).map(|l| &l.tok), Some(Tok::Ident(_))) {
            return false;
        }
        i += 1;
        if matches!(self.toks.get(i).map(|l| &l.tok), Some(Tok::LParen)) {
            let mut depth = 1;
            i += 1;
            while depth > 0 {
                match self.toks.get(i).map(|l| &l.tok) {
                    Some(Tok::LParen) => depth += 1,
                    Some(Tok::RParen) => depth -= 1,
                    Some(Tok::Eof) | None => return false,
                    _ => {}
                }
                i += 1;
            }
        }
        matches!(self.toks.get(i).map(|l| &l.tok), Some(Tok::Colon))
    }

    fn parse_operand(&mut self) -> Result<Operand, Diagnostic> {
        match self.bump() {
            Tok::Int(i) => Ok(Operand::Int(i)),
            Tok::Float(f) => Ok(Operand::Float(f)),
            Tok::Str(s) => Ok(Operand::Str(s)),
            Tok::Percent(n) => Ok(Operand::Local(n)),
            Tok::At(n) => Ok(Operand::Global(n)),
            Tok::Ident(n) => {
                if let Some(ty) = parse_type_name(&n) {
                    Ok(Operand::Type(ty))
                } else {
                    Ok(Operand::Label(n))
                }
            }
            other => Err(self.fatal("IL0025", format!("expected an operand, got {}", describe(&other)))),
        }
    }
}

fn parse_type_name(name: &str) -> Option<IlType> {
    Some(match name {
        "i1" => IlType::I1,
        "i32" => IlType::I32,
        "i64" => IlType::I64,
        "f64" => IlType::F64,
        "ptr" => IlType::Ptr,
        "void" => IlType::Void,
        _ => return None,
    })
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Ident(s) => format!("'{s}'"),
        Tok::At(s) => format!("'@{s}'"),
        Tok::Percent(s) => format!("'%{s}'"),
        Tok::Int(i) => format!("'{i}'"),
        Tok::Float(f) => format!("'{f}'"),
        Tok::Str(s) => format!("\"{s}\""),
        Tok::Word(s) => format!("'{s}'"),
        Tok::LParen => "'('".to_string(),
        Tok::RParen => "')'".to_string(),
        Tok::LBrace => "'{'".to_string(),
        Tok::RBrace => "'}'".to_string(),
        Tok::Comma => "','".to_string(),
        Tok::Colon => "':'".to_string(),
        Tok::Arrow => "'->'".to_string(),
        Tok::Eq => "'='".to_string(),
        Tok::Eof => "end of file".to_string(),
    }
}

/// Parses a complete IL text module. Structural failures the parser
/// cannot recover from (an unexpected token where the grammar names a
/// specific one, unbalanced braces) are returned as `Err` with the first
/// such diagnostic; invariant violations that leave the rest of the module
/// parseable (a duplicate block, an unresolved branch target, a shadowed
/// parameter) are recorded in the engine and parsing continues, so a
/// caller inspecting `DiagnosticEngine::succeeded()` still sees every one
/// of them after a single pass.
pub fn parse(source: &str, file_id: u32, emitter: &mut DiagnosticEmitter) -> Result<Module, Diagnostic> {
    let toks = tokenize(source, file_id);
    let mut parser = Parser { toks, pos: 0, file_id, emitter };
    parser.parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticEngine;
    use crate::source::SourceManager;

    fn run(src: &str) -> (Result<Module, Diagnostic>, DiagnosticEngine) {
        let mut sm = SourceManager::new();
        let file = sm.add_file("t.il", src);
        let mut engine = DiagnosticEngine::new();
        let result = {
            let mut emitter = DiagnosticEmitter::new(&mut engine, &sm);
            parse(src, file, &mut emitter)
        };
        (result, engine)
    }

    #[test]
    fn parses_minimal_module() {
        let src = "il 0.1.0\nfunc @main() -> i64 {\nentry:\n  ret 0\n}\n";
        let (result, engine) = run(src);
        let module = result.expect("parse ok");
        assert_eq!(module.version, "0.1.0");
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.name, "main");
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].label, "entry");
        assert!(engine.succeeded());
    }

    #[test]
    fn duplicate_version_directive_is_reported() {
        let src = "il 0.1.0\nil 0.2.0\nfunc @main() -> void {\nentry:\n  ret\n}\n";
        let (result, engine) = run(src);
        assert!(result.is_ok());
        assert!(engine.diagnostics().iter().any(|d| d.message.contains("duplicate 'il' version directive")));
    }

    #[test]
    fn missing_closing_brace_is_fatal() {
        let src = "il 0.1.0\nfunc @main() -> void {\nentry:\n  ret\n";
        let (result, _) = run(src);
        let err = result.unwrap_err();
        assert!(err.message.contains("missing '}'"));
    }

    #[test]
    fn unresolved_branch_target_is_reported() {
        let src = "il 0.1.0\nfunc @main() -> void {\nentry:\n  br missing\n}\n";
        let (result, engine) = run(src);
        assert!(result.is_ok());
        assert!(engine.diagnostics().iter().any(|d| d.message.contains("unknown block 'missing'")));
    }

    #[test]
    fn duplicate_function_param_is_reported() {
        let src = "il 0.1.2\nfunc @dup(i32 %x, i32 %x) -> void {\nentry:\n  ret\n}\n";
        let (result, engine) = run(src);
        assert!(result.is_ok());
        assert!(engine.diagnostics().iter().any(|d| d.message.contains("duplicate parameter name '%x'")));
    }

    #[test]
    fn unknown_calling_convention_is_reported() {
        let src = "il 0.1.0\nextern fastcc @foo(i32) -> void\n";
        let (result, engine) = run(src);
        assert!(result.is_ok());
        assert!(engine.diagnostics().iter().any(|d| d.message.contains("unknown calling convention 'fastcc'")));
    }

    #[test]
    fn malformed_call_trailing_tokens_is_fatal() {
        let src = "il 0.1.0\nfunc @main() -> void {\nentry:\n  %r = call i64 @foo(%a) junk\n  ret\n}\n";
        let (result, _) = run(src);
        assert!(result.is_err());
    }

    #[test]
    fn target_directive_does_not_swallow_the_next_line() {
        let src = "il 0.1.0\ntarget \"x86_64-unknown-linux-gnu\"\nfunc @main() -> void {\nentry:\n  ret\n}\n";
        let (result, engine) = run(src);
        let module = result.expect("parse ok");
        assert_eq!(module.target.as_deref(), Some("x86_64-unknown-linux-gnu"));
        assert!(engine.succeeded());
    }

    #[test]
    fn trailing_text_on_the_same_target_line_is_fatal() {
        let src = "il 0.1.0\ntarget \"x86_64-unknown-linux-gnu\" extra\nfunc @main() -> void {\nentry:\n  ret\n}\n";
        let (result, _) = run(src);
        let err = result.unwrap_err();
        assert!(err.message.contains("trailing text after target triple"));
    }
}
