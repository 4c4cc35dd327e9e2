//! Shared lexer, parser, semantic analyzer and IL text parser feeding
//! four source dialects (BASIC, Pascal, ViperLang, Zia) into one
//! intermediate language. See `SourceManager`/`DiagnosticEngine` in
//! `source`/`diagnostics` for the two objects every stage shares, and
//! `result::CompilerResult` for what a full run hands back.
pub mod ast;
pub mod diagnostics;
pub mod il;
pub mod import_resolver;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod sema;
pub mod source;
pub mod token;

use diagnostics::{DiagnosticEmitter, DiagnosticEngine};
use result::CompilerResult;
use sema::{Analyzer, Dialect as SemaDialect};
use source::SourceManager;

/// The four accepted source dialects, shared by every stage that needs to
/// branch on which frontend produced a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Basic,
    Pascal,
    ViperLang,
    Zia,
}

impl Dialect {
    fn sema_dialect(self) -> SemaDialect {
        match self {
            Dialect::Basic => SemaDialect::Basic,
            Dialect::Pascal => SemaDialect::Pascal,
            Dialect::ViperLang => SemaDialect::ViperLang,
            Dialect::Zia => SemaDialect::Zia,
        }
    }

    fn import_dialect(self) -> Option<import_resolver::Dialect> {
        match self {
            Dialect::ViperLang => Some(import_resolver::Dialect::ViperLang),
            Dialect::Zia => Some(import_resolver::Dialect::Zia),
            Dialect::Basic | Dialect::Pascal => None,
        }
    }
}

/// Runs the full pipeline over one root source file: lex, parse, resolve
/// imports (ViperLang/Zia only), analyze, and — if analysis produced no
/// error — hand the result to an already-parsed IL module supplied by the
/// caller's own lowering step. This crate does not lower dialect ASTs to
/// IL itself (that belongs to a separate downstream tier per the data
/// model's ownership split); `compile` stops after semantic analysis and
/// leaves `CompilerResult::module` unset. Callers that already have IL
/// text to validate should call `il::parser::parse` directly instead.
pub fn compile(dialect: Dialect, path: impl Into<String>, source: impl Into<String>) -> CompilerResult {
    let path = path.into();
    let source = source.into();
    let mut sm = SourceManager::new();
    let file_id = sm.add_file(path.clone(), source.clone());
    let mut engine = DiagnosticEngine::new();

    let mut module = {
        let mut emitter = DiagnosticEmitter::new(&mut engine, &sm);
        parse_with_dialect(dialect, &source, file_id, &mut emitter)
    };

    if let Some(import_dialect) = dialect.import_dialect() {
        let mut resolver = import_resolver::ImportResolver::new(import_dialect, &mut engine, &mut sm);
        resolver.resolve(&mut module, &path);
    }

    let module_exports = zia_module_exports(dialect, &module);

    let mut result = CompilerResult::new(engine, sm, file_id);
    {
        let sm_ref: &SourceManager = &result.source_manager;
        let mut emitter = DiagnosticEmitter::new(&mut result.diagnostics, sm_ref);
        let mut analyzer = Analyzer::new(dialect.sema_dialect(), &mut emitter);
        analyzer.analyze(&module);
        result.expr_types = analyzer.expr_types.clone();
        result.runtime_callees = analyzer.runtime_callees.clone();
        result.runtime_field_getters = analyzer.runtime_getters.clone();
    }
    result.module_exports = module_exports;
    result
}

fn parse_with_dialect(dialect: Dialect, source: &str, file_id: u32, emitter: &mut DiagnosticEmitter) -> ast::Decl {
    match dialect {
        Dialect::Basic => parser::basic::parse(source, file_id, emitter),
        Dialect::Pascal => parser::pascal::parse(source, file_id, emitter),
        Dialect::ViperLang => parser::viperlang::parse(source, file_id, emitter),
        Dialect::Zia => parser::zia::parse(source, file_id, emitter),
    }
}

/// Zia's per-module export table: every top-level declaration in a Zia
/// module is visible to an importer under its bare name. Other dialects
/// have no equivalent and get an empty map.
fn zia_module_exports(dialect: Dialect, module: &ast::Decl) -> std::collections::HashMap<String, String> {
    let mut exports = std::collections::HashMap::new();
    if dialect != Dialect::Zia {
        return exports;
    }
    for decl in module.module_decls() {
        let name = match &decl.kind {
            ast::DeclKind::Function(body) => Some(body.name.clone()),
            ast::DeclKind::Value(common) | ast::DeclKind::Entity(common) => Some(common.name.clone()),
            ast::DeclKind::Interface(body) => Some(body.name.clone()),
            ast::DeclKind::GlobalVar { name, .. } => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = name {
            exports.insert(name.clone(), name);
        }
    }
    exports
}
