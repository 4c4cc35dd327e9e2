//! Multi-pass semantic analyzer shared by all four dialects: a phase
//! structure, symbol kinds, and scope discipline generalized across
//! BASIC, Pascal, ViperLang, and Zia's type and namespace rules.
pub mod exhaustiveness;
pub mod runtime_registry;

use std::collections::HashMap;

use log::debug;

use crate::ast::*;
use crate::diagnostics::{DiagnosticEmitter, Severity};
use crate::source::SourceLoc;
use runtime_registry::RuntimeRegistry;

// ---------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Integer,
    Number,
    Boolean,
    String,
    Byte,
    Unit,
    Unknown,
    Optional(Box<TypeRef>),
    /// A user-declared value/entity/interface type, keyed by its
    /// fully-qualified name.
    Named(String),
    Generic(String, Vec<TypeRef>),
    Function(Vec<TypeRef>, Box<TypeRef>),
    Tuple(Vec<TypeRef>),
}

impl TypeRef {
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeRef::Integer | TypeRef::Number)
    }

    /// Arithmetic promotion: Integer+Integer stays Integer, any other
    /// numeric combination promotes to Number.
    pub fn promote_numeric(&self, other: &TypeRef) -> TypeRef {
        if *self == TypeRef::Integer && *other == TypeRef::Integer {
            TypeRef::Integer
        } else {
            TypeRef::Number
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Integer => write!(f, "Integer"),
            TypeRef::Number => write!(f, "Number"),
            TypeRef::Boolean => write!(f, "Boolean"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Byte => write!(f, "Byte"),
            TypeRef::Unit => write!(f, "Unit"),
            TypeRef::Unknown => write!(f, "<unknown>"),
            TypeRef::Optional(t) => write!(f, "{t}?"),
            TypeRef::Named(n) => write!(f, "{n}"),
            TypeRef::Generic(n, args) => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{n}<{}>", args.join(", "))
            }
            TypeRef::Function(params, ret) => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "({}) -> {ret}", params.join(", "))
            }
            TypeRef::Tuple(elems) => {
                let elems: Vec<String> = elems.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", elems.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------
// Symbols and scopes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Method,
    Field,
    Type,
    Module,
    /// A `FOR`/`for-in` loop's control variable — final like any other
    /// binding, but assignment to it gets a message naming its role
    /// rather than the generic "final variable" wording.
    LoopVariable,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub ty: TypeRef,
    pub is_final: bool,
    pub is_extern: bool,
}

struct Scope {
    parent: Option<usize>,
    symbols: HashMap<String, Symbol>,
}

/// An arena of scopes linked by parent index; `push_scope`/`pop_scope`
/// must be paired on every exit path, including error paths — enforced
/// by every caller in this module using a guard pattern rather than
/// manual push/pop pairs.
struct ScopeStack {
    scopes: Vec<Scope>,
    current: usize,
    /// Case-insensitive dialects (BASIC, Pascal) fold every symbol name
    /// through this before it's used as a hash key, both on definition
    /// and on lookup, so `X` and `x` refer to the same symbol.
    fold_case: bool,
}

impl ScopeStack {
    fn new(fold_case: bool) -> Self {
        ScopeStack { scopes: vec![Scope { parent: None, symbols: HashMap::new() }], current: 0, fold_case }
    }

    fn key(&self, name: &str) -> String {
        if self.fold_case {
            name.to_ascii_uppercase()
        } else {
            name.to_string()
        }
    }

    fn push_scope(&mut self) {
        let parent = Some(self.current);
        self.scopes.push(Scope { parent, symbols: HashMap::new() });
        self.current = self.scopes.len() - 1;
    }

    fn pop_scope(&mut self) {
        self.current = self.scopes[self.current].parent.expect("pop_scope below the global scope");
    }

    fn define(&mut self, symbol: Symbol) {
        let key = self.key(&symbol.name);
        self.scopes[self.current].symbols.insert(key, symbol);
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        let key = self.key(name);
        let mut idx = Some(self.current);
        while let Some(i) = idx {
            if let Some(sym) = self.scopes[i].symbols.get(&key) {
                return Some(sym);
            }
            idx = self.scopes[i].parent;
        }
        None
    }
}

// ---------------------------------------------------------------------
// Type declaration registry
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TypeInfo {
    qualified_name: String,
    loc: SourceLoc,
    base: Option<String>,
    implements: Vec<String>,
    is_abstract: bool,
    fields: HashMap<String, TypeRef>,
    weak_fields: Vec<String>,
    methods: HashMap<String, (Vec<TypeRef>, TypeRef, bool /* is_virtual */, bool /* is_override */, SourceLoc)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Basic,
    Pascal,
    ViperLang,
    Zia,
}

impl Dialect {
    fn case_insensitive(self) -> bool {
        matches!(self, Dialect::Basic | Dialect::Pascal)
    }
}

/// Multi-pass semantic analyzer. One instance per module (post-import-
/// resolution); `analyze` drives the six analysis phases in order.
pub struct Analyzer<'a, 'e> {
    dialect: Dialect,
    emitter: &'a mut DiagnosticEmitter<'e>,
    scopes: ScopeStack,
    types: HashMap<String, TypeInfo>,
    /// bare-name -> qualified candidates, used to detect ambiguous
    /// unqualified references across namespaces.
    name_index: HashMap<String, Vec<String>>,
    aliases: HashMap<String, String>,
    namespace_path: Vec<String>,
    loop_depth: u32,
    using_seen: bool,
    any_decl_seen: bool,
    runtime: RuntimeRegistry,
    /// Side table: expression node id -> resolved type. This is the
    /// durable output of analysis that lowering consumes.
    pub expr_types: HashMap<NodeId, TypeRef>,
    /// Side table: field-access node id -> runtime getter qualified name,
    /// populated when a `Viper.*` namespace member is resolved.
    pub runtime_getters: HashMap<NodeId, String>,
    /// Side table: call node id -> runtime callee qualified name.
    pub runtime_callees: HashMap<NodeId, String>,
}

impl<'a, 'e> Analyzer<'a, 'e> {
    pub fn new(dialect: Dialect, emitter: &'a mut DiagnosticEmitter<'e>) -> Self {
        Analyzer {
            dialect,
            emitter,
            scopes: ScopeStack::new(dialect.case_insensitive()),
            types: HashMap::new(),
            name_index: HashMap::new(),
            aliases: HashMap::new(),
            namespace_path: Vec::new(),
            loop_depth: 0,
            using_seen: false,
            any_decl_seen: false,
            runtime: RuntimeRegistry::with_builtins(),
            expr_types: HashMap::new(),
            runtime_getters: HashMap::new(),
            runtime_callees: HashMap::new(),
        }
    }

    fn error(&mut self, code: &str, loc: SourceLoc, message: impl Into<String>) {
        self.emitter.emit(Severity::Error, code, loc, 1, message);
    }

    fn warning(&mut self, code: &str, loc: SourceLoc, message: impl Into<String>) {
        self.emitter.emit(Severity::Warning, code, loc, 1, message);
    }

    pub fn analyze(&mut self, module: &Decl) -> bool {
        let decls = match &module.kind {
            DeclKind::Module { decls } => decls,
            _ => return true,
        };
        let before = self.emitter.error_count();
        debug!("registering types for {:?} module", self.dialect);
        self.register_types(decls);
        debug!("registering globals");
        self.register_globals(decls);
        debug!("registering members");
        self.register_members(decls);
        debug!("checking inheritance");
        self.check_inheritance();
        debug!("analyzing bodies");
        self.analyze_bodies(decls);
        self.emitter.error_count() == before
    }

    fn qualify(&self, name: &str) -> String {
        if self.namespace_path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace_path.join("."), name)
        }
    }

    fn index_name(&mut self, bare: &str, qualified: &str) {
        self.name_index.entry(bare.to_string()).or_default().push(qualified.to_string());
    }

    // -------------------------------------------------------------
    // Phase 1 + 2: imports/using and type registration
    // -------------------------------------------------------------

    fn register_types(&mut self, decls: &[Decl]) {
        for decl in decls {
            match &decl.kind {
                DeclKind::Using { namespace } => {
                    if self.any_decl_seen {
                        self.error("E_NS_005", decl.loc, "USING must appear before any declaration");
                    }
                    self.using_seen = true;
                    if !self.namespace_path.is_empty() {
                        self.error("E_NS_005", decl.loc, "USING inside a namespace is not allowed");
                    }
                    if namespace == runtime_registry::RESERVED_ROOT_NAMESPACE {
                        self.error("E_NS_009", decl.loc, "'Viper' is a reserved namespace and cannot be imported");
                    }
                }
                DeclKind::Import { path, alias, .. } | DeclKind::Bind { path, alias } => {
                    self.any_decl_seen = true;
                    if path == runtime_registry::RESERVED_ROOT_NAMESPACE {
                        self.error("E_NS_009", decl.loc, "'Viper' is a reserved namespace and cannot be imported");
                    }
                    if let Some(alias) = alias {
                        if self.aliases.contains_key(alias) {
                            self.error("E_NS_004", decl.loc, format!("duplicate alias '{alias}'"));
                        } else if self.name_index.contains_key(alias) {
                            self.error("E_NS_007", decl.loc, format!("alias '{alias}' conflicts with a namespace name"));
                        } else {
                            self.aliases.insert(alias.clone(), path.clone());
                        }
                    }
                }
                DeclKind::Namespace { path, decls: inner } => {
                    self.any_decl_seen = true;
                    if path == runtime_registry::RESERVED_ROOT_NAMESPACE {
                        self.error("E_NS_009", decl.loc, "'Viper' is a reserved namespace and cannot be declared");
                    }
                    self.namespace_path.push(path.clone());
                    self.register_types(inner);
                    self.namespace_path.pop();
                }
                DeclKind::Value(common) | DeclKind::Entity(common) => {
                    self.any_decl_seen = true;
                    let qualified = self.qualify(&common.name);
                    self.index_name(&common.name, &qualified);
                    self.types.insert(
                        qualified.clone(),
                        TypeInfo { qualified_name: qualified, loc: decl.loc, base: common.base.clone(), implements: common.implements.clone(), is_abstract: common.is_abstract, ..Default::default() },
                    );
                    self.scopes.define(Symbol { kind: SymbolKind::Type, name: common.name.clone(), ty: TypeRef::Named(self.qualify(&common.name)), is_final: true, is_extern: false });
                }
                DeclKind::Interface(body) => {
                    self.any_decl_seen = true;
                    let qualified = self.qualify(&body.name);
                    self.index_name(&body.name, &qualified);
                    self.types.insert(qualified.clone(), TypeInfo { qualified_name: qualified, loc: decl.loc, ..Default::default() });
                }
                DeclKind::Function(_) | DeclKind::GlobalVar { .. } => {
                    self.any_decl_seen = true;
                }
                _ => {}
            }
        }
    }

    fn register_globals(&mut self, decls: &[Decl]) {
        for decl in decls {
            match &decl.kind {
                DeclKind::GlobalVar { name, ty, is_final, init } => {
                    self.check_builtin_shadow(name, decl.loc);
                    let declared = ty.as_ref().map(|t| self.resolve_type(t));
                    let inferred = init.as_ref().map(|e| self.type_of_literal_shape(e)).unwrap_or(TypeRef::Unknown);
                    let resolved = declared.unwrap_or(inferred);
                    self.scopes.define(Symbol { kind: SymbolKind::Variable, name: name.clone(), ty: resolved, is_final: *is_final, is_extern: false });
                }
                DeclKind::Function(body) => {
                    self.check_builtin_shadow(&body.name, decl.loc);
                    let params: Vec<TypeRef> = body.params.iter().map(|p| p.ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unknown)).collect();
                    let ret = body.ret.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unit);
                    self.scopes.define(Symbol { kind: SymbolKind::Function, name: body.name.clone(), ty: TypeRef::Function(params, Box::new(ret)), is_final: true, is_extern: false });
                }
                DeclKind::Namespace { path, decls: inner } => {
                    self.namespace_path.push(path.clone());
                    self.register_globals(inner);
                    self.namespace_path.pop();
                }
                _ => {}
            }
        }
    }

    /// A user function/global whose fully-qualified name collides with a
    /// registered runtime entry shadows a builtin (`E_VIPER_BUILTIN_SHADOW`).
    fn check_builtin_shadow(&mut self, name: &str, loc: SourceLoc) {
        let qualified = self.qualify(name);
        if self.runtime.lookup_fn(&qualified).is_some() || self.runtime.lookup_getter(&qualified).is_some() {
            self.error("E_VIPER_BUILTIN_SHADOW", loc, format!("'{qualified}' shadows a built-in runtime entry"));
        }
    }

    /// A crude first-pass type estimate for globals whose initializer is
    /// a literal, used only so forward references in other globals'
    /// initializers have something to resolve against; full typing
    /// happens in `analyze_bodies`.
    fn type_of_literal_shape(&self, expr: &Expr) -> TypeRef {
        match &expr.kind {
            ExprKind::IntLiteral(_) => TypeRef::Integer,
            ExprKind::NumberLiteral(_) => TypeRef::Number,
            ExprKind::StringLiteral(_) | ExprKind::InterpolatedString(_) => TypeRef::String,
            ExprKind::BoolLiteral(_) => TypeRef::Boolean,
            ExprKind::NullLiteral => TypeRef::Optional(Box::new(TypeRef::Unknown)),
            _ => TypeRef::Unknown,
        }
    }

    fn register_members(&mut self, decls: &[Decl]) {
        for decl in decls {
            match &decl.kind {
                DeclKind::Value(common) | DeclKind::Entity(common) => {
                    let qualified = self.qualify(&common.name);
                    let mut fields = HashMap::new();
                    let mut weak_fields = Vec::new();
                    for f in &common.fields {
                        if let DeclKind::Field(fd) = &f.kind {
                            let ty = self.resolve_type(&fd.ty);
                            if fd.is_weak && !matches!(ty, TypeRef::Named(_)) {
                                self.error("B2201", f.loc, format!("'weak' requires a reference (entity/interface) type, found {ty}"));
                            }
                            if fd.is_weak {
                                weak_fields.push(fd.name.clone());
                            }
                            fields.insert(fd.name.clone(), ty);
                        }
                    }
                    let mut methods = HashMap::new();
                    for m in common.methods.iter().chain(common.constructors.iter()) {
                        if let DeclKind::Method(fb) | DeclKind::Constructor(fb) = &m.kind {
                            let params: Vec<TypeRef> = fb.params.iter().map(|p| p.ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unknown)).collect();
                            let ret = fb.ret.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unit);
                            methods.insert(fb.name.clone(), (params, ret, fb.is_virtual, fb.is_override, m.loc));
                        }
                    }
                    if let Some(info) = self.types.get_mut(&qualified) {
                        info.fields = fields;
                        info.weak_fields = weak_fields;
                        info.methods = methods;
                    }
                }
                DeclKind::Namespace { path, decls: inner } => {
                    self.namespace_path.push(path.clone());
                    self.register_members(inner);
                    self.namespace_path.pop();
                }
                _ => {}
            }
        }
    }

    fn check_inheritance(&mut self) {
        let names: Vec<String> = self.types.keys().cloned().collect();
        for name in names {
            let (base, implements, methods) = {
                let info = &self.types[&name];
                (info.base.clone(), info.implements.clone(), info.methods.clone())
            };
            if let Some(base) = &base {
                if let Some(base_info) = self.types.get(base).cloned() {
                    for (mname, (_, _, _, is_override, method_loc)) in &methods {
                        if *is_override {
                            match base_info.methods.get(mname) {
                                Some((_, _, base_virtual, _, _)) if *base_virtual => {}
                                Some(_) => {
                                    self.error("B2202", *method_loc, format!("'{mname}' overrides a non-virtual method; declare base method as 'virtual'"));
                                }
                                None => {
                                    self.error("B2202", *method_loc, format!("'{mname}' does not override any method of '{base}'"));
                                }
                            }
                        }
                    }
                }
            }
            for iface in &implements {
                if let Some(iface_info) = self.types.get(iface).cloned() {
                    for mname in iface_info.methods.keys() {
                        if !methods.contains_key(mname) {
                            let type_loc = self.types.get(&name).map(|i| i.loc).unwrap_or(SourceLoc::INVALID);
                            self.error("B2203", type_loc, format!("'{name}' must implement '{iface}.{mname}'"));
                        }
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------
    // Phase 3: body analysis
    // -------------------------------------------------------------

    fn analyze_bodies(&mut self, decls: &[Decl]) {
        for decl in decls {
            match &decl.kind {
                DeclKind::Function(body) => self.analyze_function(body, None),
                DeclKind::Value(common) | DeclKind::Entity(common) => {
                    let self_ty = TypeRef::Named(self.qualify(&common.name));
                    for m in common.methods.iter().chain(common.constructors.iter()) {
                        if let DeclKind::Method(fb) | DeclKind::Constructor(fb) = &m.kind {
                            self.analyze_function(fb, Some(self_ty.clone()));
                        }
                    }
                }
                DeclKind::Namespace { decls: inner, .. } => self.analyze_bodies(inner),
                _ => {}
            }
        }
    }

    fn analyze_function(&mut self, body: &FunctionDeclBody, self_ty: Option<TypeRef>) {
        let Some(block) = &body.body else { return };
        let ret = body.ret.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unit);
        self.scopes.push_scope();
        if let Some(self_ty) = self_ty {
            self.scopes.define(Symbol { kind: SymbolKind::Variable, name: "self".to_string(), ty: self_ty, is_final: true, is_extern: false });
        }
        for param in &body.params {
            let ty = param.ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unknown);
            self.scopes.define(Symbol { kind: SymbolKind::Parameter, name: param.name.clone(), ty, is_final: true, is_extern: false });
        }
        self.analyze_block(block, &ret);
        self.scopes.pop_scope();
    }

    fn analyze_block(&mut self, block: &Block, enclosing_ret: &TypeRef) {
        self.scopes.push_scope();
        for stmt in &block.stmts {
            self.analyze_stmt(stmt, enclosing_ret);
        }
        self.scopes.pop_scope();
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, enclosing_ret: &TypeRef) {
        match &stmt.kind {
            StmtKind::Block(b) => self.analyze_block(b, enclosing_ret),
            StmtKind::Expr(e) => {
                self.analyze_expr(e);
            }
            StmtKind::Var { name, ty, is_final, init } => {
                let declared = ty.as_ref().map(|t| self.resolve_type(t));
                let inferred = init.as_ref().map(|e| self.analyze_expr(e)).unwrap_or(TypeRef::Unknown);
                let resolved = declared.unwrap_or(inferred);
                self.scopes.define(Symbol { kind: SymbolKind::Variable, name: name.clone(), ty: resolved, is_final: *is_final, is_extern: false });
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != TypeRef::Boolean && cond_ty != TypeRef::Unknown {
                    self.error("B3001", stmt.loc, format!("condition must be Boolean, found {cond_ty}"));
                }
                self.analyze_stmt(then_branch, enclosing_ret);
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch, enclosing_ret);
                }
            }
            StmtKind::While { cond, body } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != TypeRef::Boolean && cond_ty != TypeRef::Unknown {
                    self.error("B3001", stmt.loc, format!("condition must be Boolean, found {cond_ty}"));
                }
                self.loop_depth += 1;
                self.scopes.push_scope();
                self.analyze_stmt(body, enclosing_ret);
                self.scopes.pop_scope();
                self.loop_depth -= 1;
            }
            StmtKind::For { var, start, end, step, body } => {
                let start_ty = self.analyze_expr(start);
                self.analyze_expr(end);
                if let Some(step) = step {
                    self.analyze_expr(step);
                }
                if start_ty != TypeRef::Integer && start_ty != TypeRef::Unknown {
                    self.error("B3002", stmt.loc, "'for' loop variable must be an ordinal (Integer) type");
                }
                self.loop_depth += 1;
                self.scopes.push_scope();
                self.scopes.define(Symbol { kind: SymbolKind::LoopVariable, name: var.clone(), ty: TypeRef::Integer, is_final: true, is_extern: false });
                self.analyze_stmt(body, enclosing_ret);
                self.scopes.pop_scope();
                self.loop_depth -= 1;
            }
            StmtKind::ForIn { var, iterable, body } => {
                let coll_ty = self.analyze_expr(iterable);
                let elem = match &coll_ty {
                    TypeRef::Generic(name, args) if name == "List" || name == "Set" => args.first().cloned().unwrap_or(TypeRef::Unknown),
                    TypeRef::String => TypeRef::String,
                    _ => TypeRef::Unknown,
                };
                self.loop_depth += 1;
                self.scopes.push_scope();
                self.scopes.define(Symbol { kind: SymbolKind::LoopVariable, name: var.clone(), ty: elem, is_final: true, is_extern: false });
                self.analyze_stmt(body, enclosing_ret);
                self.scopes.pop_scope();
                self.loop_depth -= 1;
            }
            StmtKind::Return(value) => {
                let ty = value.as_ref().map(|e| self.analyze_expr(e)).unwrap_or(TypeRef::Unit);
                if *enclosing_ret != TypeRef::Unit && value.is_none() {
                    self.error("B3003", stmt.loc, format!("missing return value; expected {enclosing_ret}"));
                } else if ty != *enclosing_ret && ty != TypeRef::Unknown && *enclosing_ret != TypeRef::Unknown {
                    self.error("B3003", stmt.loc, format!("return type mismatch: expected {enclosing_ret}, found {ty}"));
                }
            }
            StmtKind::Break | StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error("B3004", stmt.loc, "'break'/'continue' is only valid inside a loop");
                }
            }
            StmtKind::Guard { cond, else_body } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != TypeRef::Boolean && cond_ty != TypeRef::Unknown {
                    self.error("B3001", stmt.loc, format!("condition must be Boolean, found {cond_ty}"));
                }
                self.analyze_stmt(else_body, enclosing_ret);
                if !always_exits(else_body) {
                    self.error("B3005", stmt.loc, "'guard' else-branch must unconditionally exit the enclosing scope");
                }
            }
            StmtKind::Match { scrutinee, arms } => {
                let scrutinee_ty = self.analyze_expr(scrutinee);
                self.analyze_match_arms(arms, &scrutinee_ty, stmt.loc);
            }
            StmtKind::Label { .. } | StmtKind::Goto(_) | StmtKind::Gosub(_) => {}
        }
    }

    fn analyze_match_arms(&mut self, arms: &[MatchArm], scrutinee_ty: &TypeRef, loc: SourceLoc) {
        let (coverage, redundant) = exhaustiveness::check_arms(arms, scrutinee_ty);
        for idx in redundant {
            self.warning("B3006", arms[idx].loc, "unreachable match arm: fully shadowed by an earlier irrefutable arm");
        }
        for arm in arms {
            self.scopes.push_scope();
            self.bind_pattern(&arm.pattern, scrutinee_ty);
            if let Some(guard) = &arm.guard {
                self.analyze_expr(guard);
            }
            match &arm.body {
                MatchArmBody::Expr(e) => {
                    self.analyze_expr(e);
                }
                MatchArmBody::Block(b) => self.analyze_block(b, &TypeRef::Unit),
            }
            self.scopes.pop_scope();
        }
        if !coverage.is_exhaustive(scrutinee_ty) {
            match coverage.missing_case(scrutinee_ty) {
                Some(case) => self.error("B3007", loc, format!("non-exhaustive match: missing '{case}' arm")),
                None => self.error("B3007", loc, "non-exhaustive match"),
            }
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern, scrutinee_ty: &TypeRef) {
        match pattern {
            Pattern::Binding(name) => {
                self.scopes.define(Symbol { kind: SymbolKind::Variable, name: name.clone(), ty: scrutinee_ty.clone(), is_final: true, is_extern: false });
            }
            Pattern::Constructor { fields, .. } => {
                for f in fields {
                    self.bind_pattern(f, &TypeRef::Unknown);
                }
            }
            Pattern::Tuple(elems) => {
                for e in elems {
                    self.bind_pattern(e, &TypeRef::Unknown);
                }
            }
            Pattern::Wildcard | Pattern::Literal(_) => {}
        }
    }

    // -------------------------------------------------------------
    // Expression typing
    // -------------------------------------------------------------

    fn analyze_expr(&mut self, expr: &Expr) -> TypeRef {
        let ty = self.analyze_expr_kind(expr);
        self.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn analyze_expr_kind(&mut self, expr: &Expr) -> TypeRef {
        match &expr.kind {
            ExprKind::IntLiteral(_) => TypeRef::Integer,
            ExprKind::NumberLiteral(_) => TypeRef::Number,
            ExprKind::StringLiteral(_) => TypeRef::String,
            ExprKind::InterpolatedString(parts) => {
                for part in parts {
                    if let StringPart::Expr(e) = part {
                        self.analyze_expr(e);
                    }
                }
                TypeRef::String
            }
            ExprKind::BoolLiteral(_) => TypeRef::Boolean,
            ExprKind::NullLiteral => TypeRef::Optional(Box::new(TypeRef::Unknown)),
            ExprKind::UnitLiteral => TypeRef::Unit,
            ExprKind::Ident(name) => self.resolve_ident(name, expr.loc),
            ExprKind::SelfExpr => self.scopes.lookup("self").map(|s| s.ty.clone()).unwrap_or(TypeRef::Unknown),
            ExprKind::SuperExpr => TypeRef::Unknown,
            ExprKind::Binary { op, lhs, rhs } => self.analyze_binary(*op, lhs, rhs, expr.loc),
            ExprKind::Unary { op, operand } => {
                let ty = self.analyze_expr(operand);
                match op {
                    UnaryOp::Not => TypeRef::Boolean,
                    UnaryOp::Neg | UnaryOp::BitNot => ty,
                }
            }
            ExprKind::Ternary { cond, then_branch, else_branch } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != TypeRef::Boolean && cond_ty != TypeRef::Unknown {
                    self.error("B4001", expr.loc, format!("ternary condition must be Boolean, found {cond_ty}"));
                }
                let t = self.analyze_expr(then_branch);
                let e = self.analyze_expr(else_branch);
                common_supertype(&t, &e)
            }
            ExprKind::Call { callee, args } => self.analyze_call(callee, args, expr.id, expr.loc),
            ExprKind::Index { receiver, index } => {
                let recv_ty = self.analyze_expr(receiver);
                self.analyze_expr(index);
                match recv_ty {
                    TypeRef::Generic(name, args) if name == "List" => args.first().cloned().unwrap_or(TypeRef::Unknown),
                    TypeRef::Generic(name, args) if name == "Map" => args.get(1).cloned().unwrap_or(TypeRef::Unknown),
                    TypeRef::String => TypeRef::String,
                    _ => TypeRef::Unknown,
                }
            }
            ExprKind::Field { receiver, name } => self.analyze_field(receiver, name, expr.id, expr.loc),
            ExprKind::OptionalChain { receiver, name } => {
                let recv_ty = self.analyze_expr(receiver);
                match recv_ty {
                    TypeRef::Optional(inner) => {
                        let field_ty = self.lookup_field_type(&inner, name).unwrap_or(TypeRef::Unknown);
                        TypeRef::Optional(Box::new(field_ty))
                    }
                    _ => {
                        self.error("B4002", expr.loc, "'?.' requires an Optional receiver");
                        TypeRef::Unknown
                    }
                }
            }
            ExprKind::Coalesce { lhs, rhs } => {
                let lhs_ty = self.analyze_expr(lhs);
                let rhs_ty = self.analyze_expr(rhs);
                match lhs_ty {
                    TypeRef::Optional(inner) => *inner,
                    _ => rhs_ty,
                }
            }
            ExprKind::Is { expr: inner, ty } => {
                self.analyze_expr(inner);
                self.resolve_type(ty);
                TypeRef::Boolean
            }
            ExprKind::As { expr: inner, ty } => {
                self.analyze_expr(inner);
                self.resolve_type(ty)
            }
            ExprKind::Range { start, end, inclusive: _ } => {
                let s = self.analyze_expr(start);
                let e = self.analyze_expr(end);
                if s != TypeRef::Integer || e != TypeRef::Integer {
                    if s != TypeRef::Unknown && e != TypeRef::Unknown {
                        self.error("B4003", expr.loc, "range bounds must be Integer");
                    }
                }
                TypeRef::Generic("Range".to_string(), vec![TypeRef::Integer])
            }
            ExprKind::Try(inner) => {
                let ty = self.analyze_expr(inner);
                match ty {
                    TypeRef::Optional(t) => *t,
                    other => other,
                }
            }
            ExprKind::New { ty, args } => {
                for a in args {
                    self.analyze_expr(&a.value);
                }
                let resolved = self.resolve_type(ty);
                if let TypeRef::Named(name) = &resolved {
                    if let Some(info) = self.types.get(name) {
                        if info.is_abstract {
                            self.error("B4004", expr.loc, format!("cannot instantiate abstract type '{name}'; use a concrete subclass"));
                        }
                    }
                }
                resolved
            }
            ExprKind::Lambda { params, ret, body } => {
                self.scopes.push_scope();
                let param_types: Vec<TypeRef> = params
                    .iter()
                    .map(|p| {
                        let ty = p.ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or(TypeRef::Unknown);
                        self.scopes.define(Symbol { kind: SymbolKind::Parameter, name: p.name.clone(), ty: ty.clone(), is_final: true, is_extern: false });
                        ty
                    })
                    .collect();
                let body_ty = self.analyze_expr(body);
                self.scopes.pop_scope();
                let ret_ty = ret.as_ref().map(|t| self.resolve_type(t)).unwrap_or(body_ty);
                TypeRef::Function(param_types, Box::new(ret_ty))
            }
            ExprKind::ListLiteral(elems) => {
                let elem = self.unify_literal_elements(elems);
                TypeRef::Generic("List".to_string(), vec![elem])
            }
            ExprKind::SetLiteral(elems) => {
                let elem = self.unify_literal_elements(elems);
                TypeRef::Generic("Set".to_string(), vec![elem])
            }
            ExprKind::MapLiteral(pairs) => {
                let keys: Vec<Expr> = pairs.iter().map(|(k, _)| k.clone()).collect();
                let values: Vec<Expr> = pairs.iter().map(|(_, v)| v.clone()).collect();
                let k = self.unify_literal_elements(&keys);
                let v = self.unify_literal_elements(&values);
                TypeRef::Generic("Map".to_string(), vec![k, v])
            }
            ExprKind::TupleLiteral(elems) => {
                let types: Vec<TypeRef> = elems.iter().map(|e| self.analyze_expr(e)).collect();
                TypeRef::Tuple(types)
            }
            ExprKind::TupleIndex { receiver, index } => {
                let recv_ty = self.analyze_expr(receiver);
                match recv_ty {
                    TypeRef::Tuple(elems) => elems.get(*index as usize).cloned().unwrap_or(TypeRef::Unknown),
                    _ => TypeRef::Unknown,
                }
            }
            ExprKind::If { cond, then_branch, else_branch } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != TypeRef::Boolean && cond_ty != TypeRef::Unknown {
                    self.error("B4001", expr.loc, format!("if-expression condition must be Boolean, found {cond_ty}"));
                }
                let t = self.analyze_expr(then_branch);
                match else_branch {
                    Some(e) => {
                        let e_ty = self.analyze_expr(e);
                        common_supertype(&t, &e_ty)
                    }
                    None => TypeRef::Unit,
                }
            }
            ExprKind::Match { scrutinee, arms } => {
                let scrutinee_ty = self.analyze_expr(scrutinee);
                self.analyze_match_arms(arms, &scrutinee_ty, expr.loc);
                arms.iter()
                    .filter_map(|a| match &a.body {
                        MatchArmBody::Expr(e) => self.expr_types.get(&e.id).cloned(),
                        MatchArmBody::Block(_) => None,
                    })
                    .reduce(|a, b| common_supertype(&a, &b))
                    .unwrap_or(TypeRef::Unknown)
            }
            ExprKind::Block(block) => {
                self.scopes.push_scope();
                for stmt in &block.stmts {
                    self.analyze_stmt(stmt, &TypeRef::Unit);
                }
                let ty = block.tail.as_ref().map(|e| self.analyze_expr(e)).unwrap_or(TypeRef::Unit);
                self.scopes.pop_scope();
                ty
            }
        }
    }

    fn unify_literal_elements(&mut self, elems: &[Expr]) -> TypeRef {
        let mut iter = elems.iter();
        let Some(first) = iter.next() else { return TypeRef::Unknown };
        let mut ty = self.analyze_expr(first);
        for e in iter {
            let next = self.analyze_expr(e);
            ty = common_supertype(&ty, &next);
        }
        ty
    }

    fn analyze_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, loc: SourceLoc) -> TypeRef {
        if op == BinaryOp::Eq && is_assignable(lhs) {
            let rhs_ty = self.analyze_expr(rhs);
            let lhs_ty = self.analyze_expr(lhs);
            if let ExprKind::Ident(name) = &lhs.kind {
                if let Some(sym) = self.scopes.lookup(name) {
                    if sym.kind == SymbolKind::LoopVariable {
                        self.error("B4005", loc, format!("cannot assign to '{name}': loop variable is read-only"));
                    } else if sym.is_final {
                        self.error("B4005", loc, format!("cannot assign to final variable '{name}'"));
                    }
                }
            }
            if lhs_ty != rhs_ty && lhs_ty != TypeRef::Unknown && rhs_ty != TypeRef::Unknown && !(lhs_ty.is_numeric() && rhs_ty.is_numeric()) {
                self.error("B4006", loc, format!("cannot assign {rhs_ty} to a variable of type {lhs_ty}"));
            }
            return lhs_ty;
        }
        let lhs_ty = self.analyze_expr(lhs);
        let rhs_ty = self.analyze_expr(rhs);
        match op {
            BinaryOp::Add if lhs_ty == TypeRef::String || rhs_ty == TypeRef::String => TypeRef::String,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                if lhs_ty.is_numeric() && rhs_ty.is_numeric() {
                    lhs_ty.promote_numeric(&rhs_ty)
                } else if lhs_ty == TypeRef::Unknown || rhs_ty == TypeRef::Unknown {
                    TypeRef::Unknown
                } else {
                    self.error("B4007", loc, format!("arithmetic requires numeric operands, found {lhs_ty} and {rhs_ty}"));
                    TypeRef::Unknown
                }
            }
            BinaryOp::Mod | BinaryOp::IntDiv | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                if (lhs_ty != TypeRef::Integer && lhs_ty != TypeRef::Unknown) || (rhs_ty != TypeRef::Integer && rhs_ty != TypeRef::Unknown) {
                    self.error("B4008", loc, "this operator requires Integer operands");
                }
                TypeRef::Integer
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                if lhs_ty != rhs_ty && lhs_ty != TypeRef::Unknown && rhs_ty != TypeRef::Unknown && !(lhs_ty.is_numeric() && rhs_ty.is_numeric()) {
                    self.error("B4009", loc, format!("cannot compare {lhs_ty} with {rhs_ty}"));
                }
                TypeRef::Boolean
            }
            BinaryOp::And | BinaryOp::Or => {
                if (lhs_ty != TypeRef::Boolean && lhs_ty != TypeRef::Unknown) || (rhs_ty != TypeRef::Boolean && rhs_ty != TypeRef::Unknown) {
                    self.error("B4010", loc, "logical operators require Boolean operands");
                }
                TypeRef::Boolean
            }
        }
    }

    fn analyze_call(&mut self, callee: &Expr, args: &[Arg], call_id: NodeId, loc: SourceLoc) -> TypeRef {
        if let ExprKind::Field { receiver, name } = &callee.kind {
            if let Some(runtime_path) = self.runtime_dotted_path(receiver, name) {
                if let Some(func) = self.runtime.lookup_fn(&runtime_path).cloned() {
                    self.runtime_callees.insert(call_id, runtime_path);
                    for a in args {
                        self.analyze_expr(&a.value);
                    }
                    if args.len() != func.params.len() {
                        self.error("B4011", loc, format!("'{}' expects {} argument(s), found {}", func.qualified_name, func.params.len(), args.len()));
                    }
                    return func.ret;
                }
            }
        }
        let callee_ty = self.analyze_expr(callee);
        for a in args {
            self.analyze_expr(&a.value);
        }
        match callee_ty {
            TypeRef::Function(params, ret) => {
                if params.len() != args.len() {
                    self.error("B4011", loc, format!("expected {} argument(s), found {}", params.len(), args.len()));
                }
                *ret
            }
            TypeRef::Unknown => TypeRef::Unknown,
            other => {
                self.error("B4012", loc, format!("cannot call a value of type {other}"));
                TypeRef::Unknown
            }
        }
    }

    fn runtime_dotted_path(&self, receiver: &Expr, field: &str) -> Option<String> {
        let mut segments = vec![field.to_string()];
        let mut cur = receiver;
        loop {
            match &cur.kind {
                ExprKind::Field { receiver, name } => {
                    segments.push(name.clone());
                    cur = receiver.as_ref();
                }
                ExprKind::Ident(name) => {
                    segments.push(name.clone());
                    break;
                }
                _ => return None,
            }
        }
        segments.reverse();
        if segments.first().map(|s| s.as_str()) == Some(runtime_registry::RESERVED_ROOT_NAMESPACE) {
            Some(segments.join("."))
        } else {
            None
        }
    }

    fn analyze_field(&mut self, receiver: &Expr, name: &str, node_id: NodeId, loc: SourceLoc) -> TypeRef {
        if let Some(path) = self.runtime_dotted_path(receiver, name) {
            if let Some(ty) = self.runtime.lookup_getter(&path) {
                self.runtime_getters.insert(node_id, path);
                return ty.clone();
            }
        }
        let recv_ty = self.analyze_expr(receiver);
        match &recv_ty {
            TypeRef::Named(_) => self.lookup_field_type(&recv_ty, name).unwrap_or_else(|| {
                self.error("B4013", loc, format!("no field or method named '{name}' on {recv_ty}"));
                TypeRef::Unknown
            }),
            TypeRef::Unknown => TypeRef::Unknown,
            _ => {
                self.error("B4013", loc, format!("no field or method named '{name}' on {recv_ty}"));
                TypeRef::Unknown
            }
        }
    }

    fn lookup_field_type(&self, receiver_ty: &TypeRef, name: &str) -> Option<TypeRef> {
        let TypeRef::Named(qualified) = receiver_ty else { return None };
        let mut current = Some(qualified.clone());
        while let Some(q) = current {
            let info = self.types.get(&q)?;
            if let Some(ty) = info.fields.get(name) {
                return Some(ty.clone());
            }
            if let Some((params, ret, ..)) = info.methods.get(name) {
                return Some(TypeRef::Function(params.clone(), Box::new(ret.clone())));
            }
            current = info.base.clone();
        }
        None
    }

    fn resolve_ident(&mut self, name: &str, loc: SourceLoc) -> TypeRef {
        if let Some(sym) = self.scopes.lookup(name) {
            return sym.ty.clone();
        }
        if let Some(qualified) = self.aliases.get(name) {
            return TypeRef::Named(qualified.clone());
        }
        self.error("B4101", loc, format!("undefined name '{name}'"));
        TypeRef::Unknown
    }

    // -------------------------------------------------------------
    // Type resolution
    // -------------------------------------------------------------

    pub fn resolve_type(&mut self, node: &TypeNode) -> TypeRef {
        match &node.kind {
            TypeNodeKind::Named(name) => self.resolve_named_type(name, node.loc),
            TypeNodeKind::Generic(name, args) => {
                let args: Vec<TypeRef> = args.iter().map(|a| self.resolve_type(a)).collect();
                TypeRef::Generic(name.clone(), args)
            }
            TypeNodeKind::Optional(inner) => TypeRef::Optional(Box::new(self.resolve_type(inner))),
            TypeNodeKind::Function(params, ret) => {
                let params: Vec<TypeRef> = params.iter().map(|p| self.resolve_type(p)).collect();
                TypeRef::Function(params, Box::new(self.resolve_type(ret)))
            }
            TypeNodeKind::Tuple(elems) => TypeRef::Tuple(elems.iter().map(|e| self.resolve_type(e)).collect()),
        }
    }

    fn resolve_named_type(&mut self, name: &str, loc: SourceLoc) -> TypeRef {
        match name {
            "Integer" => return TypeRef::Integer,
            "Number" => return TypeRef::Number,
            "Boolean" => return TypeRef::Boolean,
            "String" => return TypeRef::String,
            "Byte" => return TypeRef::Byte,
            "Unit" => return TypeRef::Unit,
            _ => {}
        }
        let qualified = self.qualify(name);
        if self.types.contains_key(&qualified) {
            return TypeRef::Named(qualified);
        }
        if let Some(candidates) = self.name_index.get(name) {
            if candidates.len() == 1 {
                return TypeRef::Named(candidates[0].clone());
            }
            if candidates.len() > 1 {
                let mut sorted = candidates.clone();
                sorted.sort();
                self.error("E_NS_003", loc, format!("ambiguous reference to '{name}': candidates are {}", sorted.join(", ")));
                return TypeRef::Unknown;
            }
        }
        if let Some(qualified) = self.aliases.get(name) {
            return TypeRef::Named(qualified.clone());
        }
        self.error("E_NS_006", loc, format!("cannot resolve type '{name}'"));
        TypeRef::Unknown
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Ident(_) | ExprKind::Field { .. } | ExprKind::Index { .. } | ExprKind::TupleIndex { .. })
}

/// Common super-type of two branch types: identical types unify trivially;
/// numeric types promote; otherwise there is no common super-type and the
/// caller should treat the mismatch as `Unknown` rather than silently
/// picking one side.
fn common_supertype(a: &TypeRef, b: &TypeRef) -> TypeRef {
    if a == b {
        return a.clone();
    }
    if a.is_numeric() && b.is_numeric() {
        return a.promote_numeric(b);
    }
    if *a == TypeRef::Unknown {
        return b.clone();
    }
    if *b == TypeRef::Unknown {
        return a.clone();
    }
    TypeRef::Unknown
}

/// Conservative "always exits" check for `guard`'s else-branch: true only
/// when every path through `stmt` ends in return/break/continue,
/// never attempting data-flow through conditions.
fn always_exits(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Break | StmtKind::Continue => true,
        StmtKind::Block(b) => b.stmts.last().map(always_exits).unwrap_or(false),
        StmtKind::If { then_branch, else_branch: Some(e), .. } => always_exits(then_branch) && always_exits(e),
        _ => false,
    }
}
