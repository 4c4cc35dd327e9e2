//! The shared intermediate-language data model: the single target every
//! frontend lowers into and the only input the IL text parser produces.
//! Nothing in this module parses text; see `il::parser` for
//! that.
pub mod parser;

use std::fmt;
use std::fmt::Write as _;

/// A value type in the IL's small, closed type system. Unrecognized
/// struct-like names pass through as `Named` so user-defined records can
/// round-trip without the core knowing their layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IlType {
    I1,
    I32,
    I64,
    F64,
    Ptr,
    Void,
    Named(String),
}

impl fmt::Display for IlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IlType::I1 => "i1",
            IlType::I32 => "i32",
            IlType::I64 => "i64",
            IlType::F64 => "f64",
            IlType::Ptr => "ptr",
            IlType::Void => "void",
            IlType::Named(n) => n.as_str(),
        };
        f.write_str(s)
    }
}

/// A name/type pair, used for both function parameters and block
/// parameters, which share the same `(Type, name)` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: IlType,
    pub name: String,
}

/// One operand of an instruction. Literal operands carry their own value;
/// name references are resolved against block/function scope, not here —
/// the data model stores them unresolved, exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Str(String),
    /// A `%`-prefixed local (SSA value or block/function parameter).
    Local(String),
    /// An `@`-prefixed global (function or extern).
    Global(String),
    /// A bare identifier used as a branch/switch target or similar.
    Label(String),
    Type(IlType),
}

/// A single IL instruction, including terminators — there is no separate
/// terminator type, only the last instruction of a block, so this struct
/// doubles as both.
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub result: Option<String>,
    pub opcode: String,
    pub operands: Vec<Operand>,
    pub line: u32,
}

impl Instr {
    /// Whether this instruction's opcode ends a block's control flow.
    pub fn is_terminator(&self) -> bool {
        matches!(self.opcode.as_str(), "ret" | "br" | "cbr" | "switch")
    }

    /// Target block labels referenced by a branch or switch instruction, in
    /// textual order. Empty for anything else (including `ret`, which has
    /// no block target).
    pub fn branch_targets(&self) -> Vec<&str> {
        if !matches!(self.opcode.as_str(), "br" | "cbr" | "switch") {
            return Vec::new();
        }
        self.operands
            .iter()
            .filter_map(|o| match o {
                Operand::Label(l) => Some(l.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One basic block. `label` is unique within its owning `Function`;
/// `instructions` must end in a terminator once the parser has finished
/// validating the block (the parser rejects a block lacking one at EOF,
/// but does not otherwise enforce "terminator only at the end" — a
/// mid-block terminator is a later verifier's concern, not the text
/// parser's).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub params: Vec<Param>,
    pub instructions: Vec<Instr>,
    pub line: u32,
}

/// A calling convention tag on a function or extern header. `Ccc` is the
/// implicit default when no convention keyword is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConv {
    Ccc,
}

impl CallingConv {
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok {
            "ccc" => Some(CallingConv::Ccc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub calling_conv: CallingConv,
    pub params: Vec<Param>,
    pub ret_type: IlType,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, label: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.label == label)
    }
}

/// An `extern` declaration: a function whose body lives outside the
/// module (the runtime registry or another translation unit).
#[derive(Debug, Clone, PartialEq)]
pub struct Extern {
    pub name: String,
    pub calling_conv: CallingConv,
    pub params: Vec<IlType>,
    pub ret_type: IlType,
}

/// The whole parsed module: version directive, optional target triple,
/// externs, and function definitions, in textual order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub version: String,
    pub target: Option<String>,
    pub externs: Vec<Extern>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Renders the module back to the textual form `il::parser::parse`
    /// accepts. The round trip holds structurally, not byte-for-byte:
    /// comments and a module's original whitespace are not preserved,
    /// and an explicit `ccc` calling-convention keyword is
    /// dropped (it is the implicit default, so reparsing still recovers
    /// `CallingConv::Ccc`).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "il {}", self.version);
        if let Some(target) = &self.target {
            let _ = writeln!(out, "target {target:?}");
        }
        for ext in &self.externs {
            let params = ext.params.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
            let _ = writeln!(out, "extern @{}({params}) -> {}", ext.name, ext.ret_type);
        }
        for func in &self.functions {
            let params = func.params.iter().map(|p| format!("{} %{}", p.ty, p.name)).collect::<Vec<_>>().join(", ");
            let _ = writeln!(out, "func @{}({params}) -> {} {{", func.name, func.ret_type);
            for block in &func.blocks {
                let bparams = block.params.iter().map(|p| format!("{} %{}", p.ty, p.name)).collect::<Vec<_>>().join(", ");
                if bparams.is_empty() {
                    let _ = writeln!(out, "{}:", block.label);
                } else {
                    let _ = writeln!(out, "{}({bparams}):", block.label);
                }
                for instr in &block.instructions {
                    let _ = writeln!(out, "  {}", instr.to_text());
                }
            }
            let _ = writeln!(out, "}}");
        }
        out
    }
}

impl Instr {
    /// Renders one instruction line, without leading indentation.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        if let Some(result) = &self.result {
            let _ = write!(s, "%{result} = ");
        }
        let _ = write!(s, "{}", self.opcode);
        if self.opcode == "call" {
            if let [Operand::Type(ret), Operand::Global(callee), args @ ..] = self.operands.as_slice() {
                let args = args.iter().map(fmt_operand).collect::<Vec<_>>().join(", ");
                let _ = write!(s, " {ret} @{callee}({args})");
            }
        } else if !self.operands.is_empty() {
            let ops = self.operands.iter().map(fmt_operand).collect::<Vec<_>>().join(", ");
            let _ = write!(s, " {ops}");
        }
        s
    }
}

fn fmt_operand(op: &Operand) -> String {
    match op {
        Operand::Int(i) => i.to_string(),
        Operand::Float(f) => f.to_string(),
        Operand::Str(s) => format!("{s:?}"),
        Operand::Local(n) => format!("%{n}"),
        Operand::Global(n) => format!("@{n}"),
        Operand::Label(l) => l.clone(),
        Operand::Type(t) => t.to_string(),
    }
}
