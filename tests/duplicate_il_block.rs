//! End-to-end scenario: two blocks named `entry` in the same function.
use vil_frontend::diagnostics::{DiagnosticEmitter, DiagnosticEngine};
use vil_frontend::il::parser::parse;
use vil_frontend::source::SourceManager;

#[test]
fn duplicate_block_label_is_reported_on_the_second_definition() {
    let src = "il 0.1.0\nfunc @main() -> void {\nentry:\n  ret\nentry:\n  ret\n}\n";
    let mut sm = SourceManager::new();
    let file_id = sm.add_file("dup.il", src);
    let mut engine = DiagnosticEngine::new();
    let result = {
        let mut emitter = DiagnosticEmitter::new(&mut engine, &sm);
        parse(src, file_id, &mut emitter)
    };

    assert!(result.is_ok(), "a duplicate block is a recoverable invariant, not a fatal parse error");
    assert!(!engine.succeeded());
    let duplicate = engine
        .diagnostics()
        .iter()
        .find(|d| d.message.contains("duplicate block 'entry'"))
        .expect("expected a duplicate block diagnostic");
    assert_eq!(duplicate.primary_loc.line, 5, "the diagnostic must point at the second definition's line");
}
