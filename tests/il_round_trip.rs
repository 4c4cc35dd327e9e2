//! Round-trip property: parse, print, reparse yields structural
//! equality (not byte equality — comments and whitespace don't survive).
use vil_frontend::diagnostics::{DiagnosticEmitter, DiagnosticEngine};
use vil_frontend::il::parser::parse;
use vil_frontend::source::SourceManager;

fn parse_ok(src: &str) -> vil_frontend::il::Module {
    let mut sm = SourceManager::new();
    let file_id = sm.add_file("t.il", src);
    let mut engine = DiagnosticEngine::new();
    let mut emitter = DiagnosticEmitter::new(&mut engine, &sm);
    parse(src, file_id, &mut emitter).expect("parse ok")
}

#[test]
fn printing_and_reparsing_a_module_is_structurally_idempotent() {
    let src = concat!(
        "il 0.1.0\n",
        "target \"x86_64-unknown-linux-gnu\"\n",
        "extern @puts(ptr) -> i32\n",
        "func @main(i32 %argc) -> i64 {\n",
        "entry:\n",
        "  %r = call i32 @puts(%argc)\n",
        "  cbr %r, then, else\n",
        "then:\n",
        "  ret 1\n",
        "else:\n",
        "  ret 0\n",
        "}\n",
    );
    let module = parse_ok(src);
    let printed = module.to_text();
    let reparsed = parse_ok(&printed);
    assert_eq!(module, reparsed, "printed form:\n{printed}");
}

#[test]
fn an_empty_function_round_trips() {
    let src = "il 2\nfunc @noop() -> void {\nentry:\n  ret\n}\n";
    let module = parse_ok(src);
    let reparsed = parse_ok(&module.to_text());
    assert_eq!(module, reparsed);
}
