use test_utils::{check_failing_semantic_analysis, Expected};
use vil_frontend::Dialect;

#[test]
fn match_over_an_optional_must_cover_both_null_and_some() {
    let src = r#"
        func main() {
            let x: Integer? = null
            match x {
                null => 0
            }
        }
    "#;
    check_failing_semantic_analysis(
        Dialect::ViperLang,
        "t.viper",
        src,
        Expected { messages: &["non-exhaustive match", "some"] },
    )
    .unwrap();
}
