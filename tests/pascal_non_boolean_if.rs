use test_utils::{check_failing_semantic_analysis, Expected};
use vil_frontend::Dialect;

#[test]
fn if_condition_must_be_boolean() {
    let src = "program T; begin if 1 then WriteLn('x') end.";
    check_failing_semantic_analysis(Dialect::Pascal, "t.pas", src, Expected { messages: &["condition must be Boolean"] }).unwrap();
}
