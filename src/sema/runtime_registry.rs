//! Registered runtime (extern) functions and namespace member getters
//! backing the `Viper.*` runtime surface: the table feeding extern
//! symbol resolution and runtime-namespace field access.
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::sema::TypeRef;

#[derive(Debug, Clone)]
pub struct RuntimeFunction {
    pub qualified_name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
}

/// The reserved root namespace; user code cannot declare or import a type
/// or module named `Viper` (`E_NS_009`).
pub const RESERVED_ROOT_NAMESPACE: &str = "Viper";

fn register_fn(table: &mut HashMap<String, RuntimeFunction>, qualified_name: &str, params: Vec<TypeRef>, ret: TypeRef) {
    table.insert(qualified_name.to_string(), RuntimeFunction { qualified_name: qualified_name.to_string(), params, ret });
}

static BUILTIN_FUNCTIONS: Lazy<HashMap<String, RuntimeFunction>> = Lazy::new(|| {
    let mut table = HashMap::new();
    register_fn(&mut table, "Viper.Math.Sqrt", vec![TypeRef::Number], TypeRef::Number);
    register_fn(&mut table, "Viper.Math.Abs", vec![TypeRef::Number], TypeRef::Number);
    register_fn(&mut table, "Viper.Math.Pow", vec![TypeRef::Number, TypeRef::Number], TypeRef::Number);
    register_fn(&mut table, "Viper.Math.Floor", vec![TypeRef::Number], TypeRef::Integer);
    register_fn(&mut table, "Viper.String.Length", vec![TypeRef::String], TypeRef::Integer);
    register_fn(&mut table, "Viper.String.Concat", vec![TypeRef::String, TypeRef::String], TypeRef::String);
    register_fn(&mut table, "Viper.IO.Print", vec![TypeRef::String], TypeRef::Unit);
    register_fn(&mut table, "Viper.IO.ReadLine", vec![], TypeRef::String);
    table
});

static BUILTIN_GETTERS: Lazy<HashMap<String, TypeRef>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert("Viper.Math.Pi".to_string(), TypeRef::Number);
    table
});

/// Table of runtime-provided functions and namespace member getters,
/// keyed by fully-qualified name (e.g. `"Viper.Math.Sqrt"`,
/// `"Viper.Math.Pi"`). Backed by lazily-initialized statics shared
/// across every `Analyzer`, since the builtin surface never varies
/// between compiles.
pub struct RuntimeRegistry {
    functions: &'static HashMap<String, RuntimeFunction>,
    getters: &'static HashMap<String, TypeRef>,
}

impl RuntimeRegistry {
    pub fn with_builtins() -> Self {
        RuntimeRegistry { functions: &BUILTIN_FUNCTIONS, getters: &BUILTIN_GETTERS }
    }

    pub fn lookup_fn(&self, qualified_name: &str) -> Option<&RuntimeFunction> {
        self.functions.get(qualified_name)
    }

    pub fn lookup_getter(&self, qualified_name: &str) -> Option<&TypeRef> {
        self.getters.get(qualified_name)
    }

    /// True if `root` is a registered runtime namespace root (only
    /// `Viper` at present); used to decide whether an unresolved dotted
    /// path should be diagnosed as an unknown namespace vs. an unknown
    /// variable.
    pub fn is_namespace_root(&self, root: &str) -> bool {
        root == RESERVED_ROOT_NAMESPACE
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
