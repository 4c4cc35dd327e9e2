//! Shared scenario-test helpers, mirrored on the subprocess-based harness
//! this repo's ancestor used but rebuilt around `vil_frontend::compile`
//! directly: this crate has no binary, so "running the compiler" means
//! calling the library and inspecting the `CompilerResult` it hands back.
use anyhow::Result;

use vil_frontend::result::CompilerResult;
use vil_frontend::{compile, Dialect};

/// Installs the `env_logger` subscriber once per test process. Scenario
/// tests that want to see `debug!`/`trace!` import-resolution output run
/// with `RUST_LOG=vil_frontend=trace cargo test -- --nocapture`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What a scenario test expects to see in the diagnostics emitted for one
/// source file. An empty slice means "no diagnostics at all".
pub struct Expected<'a> {
    pub messages: &'a [&'a str],
}

impl<'a> Expected<'a> {
    fn assert_matches(&self, result: &CompilerResult) -> Result<()> {
        let seen: Vec<&str> = result.diagnostics.diagnostics().iter().map(|d| d.message.as_str()).collect();
        for wanted in self.messages {
            assert!(
                seen.iter().any(|m| m.contains(wanted)),
                "expected a diagnostic containing {wanted:?}, got {seen:?}"
            );
        }
        Ok(())
    }
}

fn run(dialect: Dialect, path: &str, source: &str) -> CompilerResult {
    init_logging();
    compile(dialect, path, source)
}

/// Compiles `source` and asserts it succeeds with no errors. Panics with
/// the rendered diagnostics on failure so a failing scenario test points
/// straight at the offending line.
pub fn check_compilation(dialect: Dialect, path: &str, source: &str) -> Result<()> {
    let result = run(dialect, path, source);
    if !result.succeeded() {
        let mut rendered = String::new();
        result.print_diagnostics(&mut rendered);
        panic!("expected {path} to compile cleanly, got:\n{rendered}");
    }
    Ok(())
}

/// Compiles `source` and asserts it fails, with `expected` describing the
/// diagnostics that must be present among the errors reported.
pub fn check_failing_semantic_analysis(
    dialect: Dialect,
    path: &str,
    source: &str,
    expected: Expected,
) -> Result<()> {
    let result = run(dialect, path, source);
    assert!(!result.succeeded(), "expected {path} to fail analysis, but it compiled cleanly");
    expected.assert_matches(&result)
}

/// Like [`check_compilation`] but also hands back the `CompilerResult`, for
/// scenario tests that need to inspect side-tables (`expr_types`,
/// `module_exports`, ...) after asserting success.
pub fn compile_ok(dialect: Dialect, path: &str, source: &str) -> Result<CompilerResult> {
    let result = run(dialect, path, source);
    if !result.succeeded() {
        let mut rendered = String::new();
        result.print_diagnostics(&mut rendered);
        panic!("expected {path} to compile cleanly, got:\n{rendered}");
    }
    Ok(result)
}
