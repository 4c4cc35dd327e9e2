//! Recursive import resolver for ViperLang and Zia: a depth-first walk
//! over `import`/`bind` declarations that loads, parses, and recursively
//! resolves each target, then prepends its declarations into the
//! importing module so imported symbols precede any reference to them.
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::ast::{Decl, DeclKind};
use crate::diagnostics::{DiagnosticEmitter, DiagnosticEngine, Severity};
use crate::source::{normalize_path, SourceLoc, SourceManager};

const MAX_IMPORT_DEPTH: usize = 50;
const MAX_IMPORTED_FILES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    ViperLang,
    Zia,
}

impl Dialect {
    fn extension(self) -> &'static str {
        match self {
            Dialect::ViperLang => "viper",
            Dialect::Zia => "zia",
        }
    }

    /// Whether a bind/import cycle is tolerated (Zia) or a hard error
    /// (ViperLang).
    fn tolerates_cycles(self) -> bool {
        matches!(self, Dialect::Zia)
    }

    fn parse(self, source: &str, file_id: u32, emitter: &mut DiagnosticEmitter) -> Decl {
        match self {
            Dialect::ViperLang => crate::parser::viperlang::parse(source, file_id, emitter),
            Dialect::Zia => crate::parser::zia::parse(source, file_id, emitter),
        }
    }

    fn import_error_code(self) -> &'static str {
        match self {
            Dialect::ViperLang => "V0501",
            Dialect::Zia => "Z0501",
        }
    }
}

/// Depth-first import resolver. One instance resolves the full transitive
/// import graph of a single root module.
pub struct ImportResolver<'a> {
    dialect: Dialect,
    diag: &'a mut DiagnosticEngine,
    sm: &'a mut SourceManager,
    processed: Vec<String>,
    in_progress: Vec<String>,
    import_stack: Vec<String>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(dialect: Dialect, diag: &'a mut DiagnosticEngine, sm: &'a mut SourceManager) -> Self {
        ImportResolver {
            dialect,
            diag,
            sm,
            processed: Vec::new(),
            in_progress: Vec::new(),
            import_stack: Vec::new(),
        }
    }

    /// Resolve every transitive import of `module`, whose own source lives
    /// at `module_path`. Imported declarations are merged in-place.
    pub fn resolve(&mut self, module: &mut Decl, module_path: &str) -> bool {
        let root = normalize_path(module_path);
        self.in_progress.push(root.clone());
        self.import_stack.push(root.clone());
        let ok = self.process_module(module, module_path, SourceLoc::INVALID, 0);
        self.import_stack.pop();
        self.in_progress.retain(|p| p != &root);
        self.processed.push(root);
        ok
    }

    fn process_module(&mut self, module: &mut Decl, module_path: &str, _via: SourceLoc, depth: usize) -> bool {
        debug!("entering module '{module_path}' at import depth {depth}");
        let ok = self.process_module_inner(module, module_path, depth);
        debug!("leaving module '{module_path}' (ok = {ok})");
        ok
    }

    fn process_module_inner(&mut self, module: &mut Decl, module_path: &str, depth: usize) -> bool {
        if depth > MAX_IMPORT_DEPTH {
            self.diag.report(crate::diagnostics::Diagnostic::new(
                Severity::Error,
                self.dialect.import_error_code(),
                SourceLoc::INVALID,
                1,
                format!("import depth exceeds the maximum of {MAX_IMPORT_DEPTH}"),
            ));
            return false;
        }

        let decls = match &mut module.kind {
            DeclKind::Module { decls } => decls,
            _ => return true,
        };

        let import_specs: Vec<(String, SourceLoc)> = decls
            .iter()
            .filter_map(|d| match &d.kind {
                DeclKind::Import { path, .. } => Some((path.clone(), d.loc)),
                DeclKind::Bind { path, .. } => Some((path.clone(), d.loc)),
                _ => None,
            })
            .collect();

        let mut prepend = Vec::new();
        let mut ok = true;
        for (raw_path, loc) in import_specs {
            let target = resolve_import_path(&raw_path, module_path, self.dialect.extension());
            let normalized = normalize_path(&target);
            trace!("resolving import edge '{raw_path}' -> '{normalized}' from '{module_path}'");

            if self.processed.contains(&normalized) {
                continue;
            }
            if self.in_progress.contains(&normalized) {
                if self.dialect.tolerates_cycles() {
                    continue;
                }
                let trace = self.import_stack.join(" -> ");
                self.diag.report(crate::diagnostics::Diagnostic::new(
                    Severity::Error,
                    self.dialect.import_error_code(),
                    loc,
                    1,
                    format!("circular import of '{normalized}' (trace: {trace} -> {normalized})"),
                ));
                ok = false;
                continue;
            }
            if self.processed.len() + self.in_progress.len() >= MAX_IMPORTED_FILES {
                self.diag.report(crate::diagnostics::Diagnostic::new(
                    Severity::Error,
                    self.dialect.import_error_code(),
                    loc,
                    1,
                    format!("import graph exceeds the maximum of {MAX_IMPORTED_FILES} files"),
                ));
                ok = false;
                continue;
            }

            let Some(source) = read_source(&target) else {
                self.diag.report(crate::diagnostics::Diagnostic::new(
                    Severity::Error,
                    self.dialect.import_error_code(),
                    loc,
                    1,
                    format!("cannot read imported file '{target}'"),
                ));
                ok = false;
                continue;
            };

            let file_id = self.sm.add_file(target.clone(), source.clone());
            let mut imported = {
                let mut emitter = DiagnosticEmitter::new(self.diag, self.sm);
                self.dialect.parse(&source, file_id, &mut emitter)
            };

            self.in_progress.push(normalized.clone());
            self.import_stack.push(normalized.clone());
            let nested_ok = self.process_module(&mut imported, &target, loc, depth + 1);
            self.import_stack.pop();
            self.in_progress.retain(|p| p != &normalized);
            self.processed.push(normalized);
            ok = ok && nested_ok;

            if let DeclKind::Module { decls: imported_decls } = imported.kind {
                prepend.extend(imported_decls);
            }
        }

        if let DeclKind::Module { decls } = &mut module.kind {
            let mut merged = prepend;
            merged.append(decls);
            *decls = merged;
        }
        ok
    }
}

fn resolve_import_path(import_path: &str, importing_file: &str, extension: &str) -> String {
    let mut candidate = PathBuf::from(import_path);
    if candidate.extension().is_none() {
        candidate.set_extension(extension);
    }
    if candidate.is_relative() {
        if let Some(dir) = Path::new(importing_file).parent() {
            return dir.join(candidate).to_string_lossy().into_owned();
        }
    }
    candidate.to_string_lossy().into_owned()
}

fn read_source(path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_import_path_adds_dialect_extension() {
        assert_eq!(resolve_import_path("utils/math", "/src/main.zia", "zia"), "/src/utils/math.zia");
    }

    #[test]
    fn resolve_import_path_keeps_existing_extension() {
        assert_eq!(resolve_import_path("utils/math.zia", "/src/main.zia", "zia"), "/src/utils/math.zia");
    }
}
