//! The pipeline's top-level output: everything a downstream collaborator
//! needs after one run over a single root source file, whether or not it
//! succeeded.
use std::collections::HashMap;

use crate::ast::NodeId;
use crate::diagnostics::DiagnosticEngine;
use crate::il::Module as IlModule;
use crate::sema::TypeRef;
use crate::source::SourceManager;

/// Aggregates the DiagnosticEngine, the root file's id, the produced IL
/// module (absent if a fatal error stopped the pipeline before lowering),
/// and the read-only side-tables populated during analysis. Owned by the
/// caller; nothing here is shared across compilations.
pub struct CompilerResult {
    pub diagnostics: DiagnosticEngine,
    pub source_manager: SourceManager,
    pub file_id: u32,
    pub module: Option<IlModule>,
    /// Expression-type side-table, keyed by `Expr`/`Stmt` node identity.
    pub expr_types: HashMap<NodeId, TypeRef>,
    /// Call nodes that resolved to a registered runtime function, keyed
    /// by the call expression's node id, valued with the runtime
    /// function's fully-qualified name.
    pub runtime_callees: HashMap<NodeId, String>,
    /// Field-access nodes that resolved to a runtime namespace getter
    /// (e.g. `Viper.Math.Pi`), keyed by the field expression's node id.
    pub runtime_field_getters: HashMap<NodeId, String>,
    /// Zia's per-module export table: declared name → the qualified name
    /// an importer sees it under. Empty for every other dialect.
    pub module_exports: HashMap<String, String>,
}

impl CompilerResult {
    pub fn new(diagnostics: DiagnosticEngine, source_manager: SourceManager, file_id: u32) -> Self {
        CompilerResult {
            diagnostics,
            source_manager,
            file_id,
            module: None,
            expr_types: HashMap::new(),
            runtime_callees: HashMap::new(),
            runtime_field_getters: HashMap::new(),
            module_exports: HashMap::new(),
        }
    }

    /// True iff no stage reported an error. Mirrors `DiagnosticEngine`'s
    /// own counter rather than inspecting the IL module's presence, since
    /// a module can still be produced alongside warnings.
    pub fn succeeded(&self) -> bool {
        self.diagnostics.error_count() == 0
    }

    pub fn print_diagnostics(&self, out: &mut dyn std::fmt::Write) {
        self.diagnostics.print_all(out, Some(&self.source_manager));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, Severity};
    use crate::source::SourceLoc;

    #[test]
    fn succeeded_tracks_error_count() {
        let sm = SourceManager::new();
        let mut engine = DiagnosticEngine::new();
        let mut result = CompilerResult::new(engine, sm, 0);
        assert!(result.succeeded());

        engine = DiagnosticEngine::new();
        engine.report(Diagnostic::new(Severity::Error, "X0001", SourceLoc::INVALID, 1, "boom"));
        result = CompilerResult::new(engine, SourceManager::new(), 0);
        assert!(!result.succeeded());
    }
}
