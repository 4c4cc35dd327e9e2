//! Shared token representation used by all four dialect lexers: a token
//! carries its spelling and source position, and the kind list spans
//! every dialect's keywords and punctuation, including string
//! interpolation segments.
use crate::source::SourceLoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Ident,
    /// Statement separator in BASIC. Runs of blank lines collapse to a
    /// single token; other dialects never emit this.
    Newline,

    IntLiteral,
    NumberLiteral,
    StringLiteral,
    CharLiteral,
    /// Opens an interpolated string: the text before the first `${`.
    StringStart,
    /// Text between two `${ ... }` segments of an interpolated string.
    StringMid,
    /// Closes an interpolated string: the text after the last `}`.
    StringEnd,

    // Keywords (superset across dialects; each lexer only emits the ones
    // its keyword table defines).
    KwLet,
    KwVar,
    KwConst,
    KwFinal,
    KwFunc,
    KwSub,
    KwReturn,
    KwIf,
    KwThen,
    KwElse,
    KwElseIf,
    KwWhile,
    KwFor,
    KwTo,
    KwStep,
    KwDo,
    KwNext,
    KwIn,
    KwBreak,
    KwContinue,
    KwMatch,
    KwCase,
    KwSelect,
    KwGuard,
    KwNull,
    KwTrue,
    KwFalse,
    KwNew,
    KwSelfKw,
    KwSuper,
    KwIs,
    KwAs,
    KwValue,
    KwEntity,
    KwClass,
    KwInterface,
    KwImplements,
    KwInherits,
    KwVirtual,
    KwOverride,
    KwAbstract,
    KwFinalMember,
    KwWeak,
    KwNamespace,
    KwUsing,
    KwImport,
    KwBind,
    KwEnd,
    KwBegin,
    KwProgram,
    KwProcedure,
    KwFunction,
    KwConstructor,
    KwDestructor,
    KwProperty,
    KwGet,
    KwSet,
    KwLambda,
    KwFn,
    KwList,
    KwMapKw,
    KwSetKw,
    KwExtends,
    KwAnd,
    KwOr,
    KwNot,
    KwMod,
    KwDiv,
    KwByRef,
    KwByVal,
    KwRem,
    KwGoto,
    KwGosub,
    KwLoop,
    KwWend,
    KwOf,
    KwRecord,
    KwArray,
    KwDownTo,

    // Punctuation / operators.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    ColonColon,
    Semicolon,
    Dot,
    DotDot,
    DotDotEq,
    QuestionDot,
    QuestionQuestion,
    Question,
    Bang,
    Arrow,
    FatArrow,
    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,
    At,
    Dollar,
    Backslash,

    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Original spelling as it appeared in the source.
    pub text: String,
    /// Case-folded spelling for dialects with case-insensitive identifiers;
    /// equal to `text` otherwise.
    pub canonical: String,
    pub loc: SourceLoc,
    pub numeric_value: Option<f64>,
    pub string_value: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: SourceLoc) -> Self {
        let text = text.into();
        Token {
            kind,
            canonical: text.clone(),
            text,
            loc,
            numeric_value: None,
            string_value: None,
        }
    }

    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical = canonical.into();
        self
    }

    pub fn with_numeric(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.string_value = Some(value.into());
        self
    }

    pub fn eof(loc: SourceLoc) -> Self {
        Token::new(TokenKind::Eof, "", loc)
    }
}
