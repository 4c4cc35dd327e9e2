use test_utils::{check_failing_semantic_analysis, Expected};
use vil_frontend::Dialect;

#[test]
fn assigning_to_the_for_loop_variable_is_rejected() {
    let src = "program T; begin for i := 1 to 10 do i := 5 end.";
    check_failing_semantic_analysis(
        Dialect::Pascal,
        "t.pas",
        src,
        Expected { messages: &["loop variable is read-only"] },
    )
    .unwrap();
}
