//! Boundary: an import chain of exactly 50 levels compiles; 51 is a
//! fatal diagnostic. Builds a real chain of single-segment ViperLang
//! modules on disk, since `ImportResolver` reads imports from the
//! filesystem relative to the importing file's directory.
use std::fs;
use std::path::PathBuf;

use vil_frontend::{compile, Dialect};

fn build_chain(dir: &std::path::Path, hops: usize) -> String {
    for i in 0..hops {
        let next = if i + 1 < hops { format!("import mod{}\n", i + 1) } else { String::new() };
        fs::write(dir.join(format!("mod{i}.viper")), next).unwrap();
    }
    format!("import mod0\n")
}

fn unique_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vil_frontend_import_chain_{label}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn a_chain_of_exactly_fifty_levels_compiles() {
    let dir = unique_dir("ok");
    let root_src = build_chain(&dir, 50);
    let root_path = dir.join("root.viper");
    let result = compile(Dialect::ViperLang, root_path.to_string_lossy().into_owned(), root_src);
    assert!(result.succeeded(), "a 50-level import chain must compile cleanly");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn a_chain_of_fifty_one_levels_is_a_fatal_diagnostic() {
    let dir = unique_dir("fail");
    let root_src = build_chain(&dir, 51);
    let root_path = dir.join("root.viper");
    let result = compile(Dialect::ViperLang, root_path.to_string_lossy().into_owned(), root_src);
    assert!(!result.succeeded(), "a 51-level import chain must fail");
    assert!(result.diagnostics.diagnostics().iter().any(|d| d.message.contains("import depth exceeds the maximum")));
    let _ = fs::remove_dir_all(&dir);
}
