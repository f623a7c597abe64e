//! AST node types for Quill expressions.
//!
//! Every node carries a [`Span`] for error reporting and a [`Kind`] slot
//! that stays `Unknown` until the checker fills it in.
//! Pipes are desugared by the parser and never appear here.

use crate::{Kind, Span};

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Static kind, assigned by the checker.
    pub ty: Kind,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: Kind::Unknown,
        }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`
    IntLit(i64),
    /// `3.14`, `.5`, `1e3`
    FloatLit(f64),
    /// `"hello"`, `'hello'`
    StringLit(String),
    /// `true` / `false`
    BoolLit(bool),
    /// `nil`
    NilLit,
    /// `[expr, ...]`
    ArrayLit(Vec<Expr>),
    /// `{key: expr, ...}`
    MapLit(Vec<MapEntry>),

    // ── Names ──
    /// `count`, `$env`
    Identifier(String),
    /// `#` inside a `map`/`filter` predicate.
    Placeholder,

    // ── Access & Calls ──
    /// `expr[key]`
    Index { target: Box<Expr>, key: Box<Expr> },
    /// `expr.name`
    Member { target: Box<Expr>, name: String },
    /// `callee(args...)`; `x | f(a)` arrives here as `f(x, a)`.
    Call { callee: Box<Expr>, args: Vec<Expr> },

    // ── Operators ──
    /// `-x`, `!x`, `not x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `a + b`, `a ?? b`, `a in b`, ...
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `low..high`
    Range { low: Box<Expr>, high: Box<Expr> },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// An entry in a map literal. Keys are always strings.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

impl Expr {
    /// The callee name when this is a call to a plain identifier.
    pub fn call_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call { callee, .. } => match &callee.kind {
                ExprKind::Identifier(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

// ── Binary Operators ──────────────────────────────────────────────────────────

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Nil handling
    Coalesce,
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    In,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Coalesce => "??",
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::In => "in",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`, `not x`
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
