use test_utils::{check_failing_semantic_analysis, Expected};
use vil_frontend::Dialect;

#[test]
fn using_after_a_namespace_declaration_is_rejected() {
    let src = "NAMESPACE A\nEND NAMESPACE\nUSING A\n";
    check_failing_semantic_analysis(
        Dialect::Basic,
        "t.bas",
        src,
        Expected { messages: &["USING must appear before"] },
    )
    .unwrap();
}
