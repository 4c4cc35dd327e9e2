use test_utils::{check_failing_semantic_analysis, Expected};
use vil_frontend::{compile, Dialect};

const SRC: &str = r#"
        class TBase
        record
            procedure DoWork;
            begin
            end;
        end;

        class TChild inherits TBase
        record
            override procedure DoWork;
            begin
            end;
        end;

        begin
        end.
    "#;

#[test]
fn overriding_a_non_virtual_base_method_is_rejected() {
    check_failing_semantic_analysis(
        Dialect::Pascal,
        "t.pas",
        SRC,
        Expected { messages: &["override", "virtual"] },
    )
    .unwrap();
}

#[test]
fn the_diagnostic_points_at_the_overriding_method_not_an_invalid_location() {
    let result = compile(Dialect::Pascal, "t.pas", SRC);
    let diag = result
        .diagnostics
        .diagnostics()
        .iter()
        .find(|d| d.code == "B2202")
        .expect("a B2202 diagnostic must be reported");
    assert!(diag.primary_loc.is_valid(), "B2202 must carry a real source location, not SourceLoc::INVALID");
    assert_eq!(diag.primary_loc.line, 11, "B2202 should point at the overriding 'DoWork' declaration");
}
