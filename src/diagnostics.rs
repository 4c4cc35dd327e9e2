//! Diagnostic collection and rendering: an accumulator shared across a
//! whole compile run, plus a per-pass convenience wrapper with source
//! caching for rendering a diagnostic's source line.
use std::fmt::Write as _;

use crate::source::{SourceLoc, SourceManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short stable identifier, e.g. `B1001`, `E_NS_003`. Empty when the
    /// dialect has no code for this diagnostic.
    pub code: String,
    pub message: String,
    pub primary_loc: SourceLoc,
    /// Number of characters underlined; 0 or 1 both render a single caret.
    pub length: u32,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        loc: SourceLoc,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            primary_loc: loc,
            length,
        }
    }
}

/// A pure accumulator: `report` appends and updates severity counters,
/// `print_all` renders every diagnostic in emission order. Counters never
/// decrease.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diag);
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn succeeded(&self) -> bool {
        self.error_count() == 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every diagnostic, in emission order, to `out`.
    pub fn print_all(&self, out: &mut dyn std::fmt::Write, sm: Option<&SourceManager>) {
        for diag in &self.diagnostics {
            render_one(out, diag, sm);
        }
    }
}

fn render_one(out: &mut dyn std::fmt::Write, diag: &Diagnostic, sm: Option<&SourceManager>) {
    let loc = diag.primary_loc;
    if loc.is_valid() {
        let path = sm.and_then(|sm| sm.path(loc.file_id)).unwrap_or("<unknown>");
        let code = if diag.code.is_empty() {
            String::new()
        } else {
            format!("[{}]", diag.code)
        };
        let _ = writeln!(
            out,
            "{path}:{line}:{col}: {sev}{code}: {msg}",
            path = path,
            line = loc.line,
            col = loc.column,
            sev = diag.severity,
            code = code,
            msg = diag.message,
        );
        let line_text = sm.map(|sm| sm.line_text(loc.file_id, loc.line)).unwrap_or_default();
        if !line_text.is_empty() {
            let _ = writeln!(out, "{line_text}");
            let carets = diag.length.max(1);
            let pad = " ".repeat(loc.column.saturating_sub(1) as usize);
            let carets = "^".repeat(carets as usize);
            let _ = writeln!(out, "{pad}{carets}");
        }
    } else {
        let code = if diag.code.is_empty() {
            String::new()
        } else {
            format!("[{}]", diag.code)
        };
        let _ = writeln!(out, "{sev}{code}: {msg}", sev = diag.severity, code = code, msg = diag.message);
    }
}

/// Thin per-pass wrapper around `DiagnosticEngine`, borrowing the
/// `SourceManager` it needs to render a diagnostic's source line.
pub struct DiagnosticEmitter<'a> {
    engine: &'a mut DiagnosticEngine,
    sm: &'a SourceManager,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(engine: &'a mut DiagnosticEngine, sm: &'a SourceManager) -> Self {
        Self { engine, sm }
    }

    pub fn emit(
        &mut self,
        severity: Severity,
        code: impl Into<String>,
        loc: SourceLoc,
        length: u32,
        message: impl Into<String>,
    ) {
        self.engine.report(Diagnostic::new(severity, code, loc, length, message));
    }

    pub fn emit_expected(&mut self, got: impl std::fmt::Display, wanted: impl std::fmt::Display, loc: SourceLoc) {
        self.emit(
            Severity::Error,
            "",
            loc,
            1,
            format!("expected {wanted}, got {got}"),
        );
    }

    pub fn error_count(&self) -> usize {
        self.engine.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.engine.warning_count()
    }

    pub fn print_all(&self, out: &mut dyn std::fmt::Write) {
        self.engine.print_all(out, Some(self.sm));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_never_decrease() {
        let mut engine = DiagnosticEngine::new();
        engine.report(Diagnostic::new(Severity::Error, "X0001", SourceLoc::INVALID, 1, "boom"));
        engine.report(Diagnostic::new(Severity::Warning, "X0002", SourceLoc::INVALID, 1, "hmm"));
        assert_eq!(engine.error_count(), 1);
        assert_eq!(engine.warning_count(), 1);
        assert!(!engine.succeeded());
    }

    #[test]
    fn print_all_preserves_emission_order() {
        let mut engine = DiagnosticEngine::new();
        engine.report(Diagnostic::new(Severity::Error, "A", SourceLoc::INVALID, 1, "first"));
        engine.report(Diagnostic::new(Severity::Error, "B", SourceLoc::INVALID, 1, "second"));
        let mut out = String::new();
        engine.print_all(&mut out, None);
        let first_pos = out.find("first").unwrap();
        let second_pos = out.find("second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn renders_caret_under_column() {
        let mut sm = SourceManager::new();
        let file = sm.add_file("t.bas", "PRINT x");
        let mut engine = DiagnosticEngine::new();
        engine.report(Diagnostic::new(
            Severity::Error,
            "B0001",
            SourceLoc::new(file, 1, 7),
            1,
            "undefined name 'x'",
        ));
        let mut out = String::new();
        engine.print_all(&mut out, Some(&sm));
        assert!(out.contains("t.bas:1:7: error[B0001]: undefined name 'x'"));
        assert!(out.contains("PRINT x"));
        assert!(out.contains("      ^"));
    }
}
