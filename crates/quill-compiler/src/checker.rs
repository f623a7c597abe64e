//! Quill checker: walks a parsed expression, resolves names and assigns a
//! [`Kind`] to every node.
//!
//! Entry point: [`TypeChecker::check`].
//!
//! Error codes emitted:
//! - E200: unknown name
//! - E201: operand or argument kind mismatch
//! - E202: wrong argument count
//! - E203: invalid built-in argument
//! - E204: indexing a kind that cannot be indexed
//! - E205: calling something that is not callable
//! - E206: unknown field or method
//! - E207: `#` outside a predicate
//! - E208: result kind differs from the requested one

use std::collections::BTreeMap;

use quill_stdlib::{builtins, methods, ArgInfo, Builtin, BuiltinRegistry, Value};
use quill_types::ast::*;
use quill_types::{CompileErrors, Diagnostic, ErrorCode, Kind, Signature, SourceFile, Span};

use crate::descriptor::Descriptor;
use crate::env::TypeEnv;

// ══════════════════════════════════════════════════════════════════════════════
// TypeChecker
// ══════════════════════════════════════════════════════════════════════════════

/// Checks one expression tree, filling in [`Expr::ty`] as it goes.
pub struct TypeChecker<'a> {
    env: TypeEnv<'a>,
    errors: &'a mut CompileErrors,
    source: &'a SourceFile,
    registry: &'static BuiltinRegistry,
}

impl<'a> TypeChecker<'a> {
    pub fn new(
        errors: &'a mut CompileErrors,
        source: &'a SourceFile,
        descriptor: Option<&'a Descriptor>,
    ) -> Self {
        Self {
            env: TypeEnv::new(descriptor),
            errors,
            source,
            registry: builtins(),
        }
    }

    /// Check a whole expression. When `expected` is given the result must be
    /// assignable to it.
    pub fn check(&mut self, expr: &mut Expr, expected: Option<&Kind>) -> Kind {
        let kind = self.check_expr(expr);
        if let Some(expected) = expected {
            if !kind.is_assignable_to(expected) {
                self.error(
                    ErrorCode::UNEXPECTED_RESULT_KIND,
                    format!("expected {expected}, but got {kind}"),
                    expr.span,
                );
            }
        }
        kind
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn check_expr(&mut self, expr: &mut Expr) -> Kind {
        let span = expr.span;
        let kind = match &mut expr.kind {
            // ── Literals ──
            ExprKind::IntLit(_) => Kind::Int,
            ExprKind::FloatLit(_) => Kind::Float,
            ExprKind::StringLit(_) => Kind::String,
            ExprKind::BoolLit(_) => Kind::Bool,
            ExprKind::NilLit => Kind::Nil,

            ExprKind::ArrayLit(items) => {
                let elem = items
                    .iter_mut()
                    .fold(Kind::Unknown, |acc, item| acc.unify(&self.check_expr(item)));
                match elem {
                    Kind::Unknown => Kind::array(Kind::Any),
                    elem => Kind::array(elem),
                }
            }

            ExprKind::MapLit(entries) => {
                let mut fields = BTreeMap::new();
                for entry in entries.iter_mut() {
                    let kind = self.check_expr(&mut entry.value);
                    fields.insert(entry.key.clone(), kind);
                }
                Kind::Record(fields)
            }

            // ── Names ──
            ExprKind::Identifier(name) => match self.env.lookup(name) {
                Some(kind) => kind,
                None => {
                    let message = format!("unknown name {name}");
                    self.error(ErrorCode::UNKNOWN_NAME, message, span);
                    Kind::Unknown
                }
            },

            ExprKind::Placeholder => match self.env.placeholder() {
                Some(kind) => kind.clone(),
                None => {
                    self.error(
                        ErrorCode::PLACEHOLDER_OUTSIDE_PREDICATE,
                        "cannot use # outside of map or filter".to_string(),
                        span,
                    );
                    Kind::Unknown
                }
            },

            // ── Access & Calls ──
            ExprKind::Index { target, key } => {
                let target_kind = self.check_expr(target);
                let key_kind = self.check_expr(key);
                let literal = match &key.kind {
                    ExprKind::StringLit(s) => Some(s.as_str()),
                    _ => None,
                };
                self.index_kind(&target_kind, &key_kind, literal, span)
            }

            ExprKind::Member { target, name } => {
                let target_kind = self.check_expr(target);
                self.member_kind(&target_kind, name, span)
            }

            ExprKind::Call { callee, args } => self.check_call(callee, args, span),

            // ── Operators ──
            ExprKind::Unary { op, operand } => {
                let op = *op;
                self.check_unary(op, operand, span)
            }

            ExprKind::Binary { left, op, right } => {
                let op = *op;
                self.check_binary(left, op, right, span)
            }

            ExprKind::Range { low, high } => {
                for bound in [low, high] {
                    let kind = self.check_expr(bound);
                    if !kind.is_integer() {
                        self.error(
                            ErrorCode::TYPE_MISMATCH,
                            format!("range bounds must be int (got {kind})"),
                            bound.span,
                        );
                    }
                }
                Kind::array(Kind::Int)
            }

            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.check_expr(cond);
                let then_kind = self.check_expr(then);
                let else_kind = self.check_expr(otherwise);
                then_kind.unify(&else_kind)
            }
        };
        expr.ty = kind.clone();
        kind
    }

    // ── Indexing and members ──────────────────────────────────────────────

    fn index_kind(&mut self, target: &Kind, key: &Kind, literal: Option<&str>, span: Span) -> Kind {
        match target {
            Kind::Array(elem) => {
                if !key.is_integer() {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("array index must be int (got {key})"),
                        span,
                    );
                }
                (**elem).clone()
            }
            Kind::Map(value) => {
                if !key.is_string() {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("map key must be string (got {key})"),
                        span,
                    );
                }
                (**value).clone()
            }
            Kind::Record(fields) => {
                if !key.is_string() {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("map key must be string (got {key})"),
                        span,
                    );
                }
                literal
                    .and_then(|name| fields.get(name).cloned())
                    .unwrap_or(Kind::Any)
            }
            k if k.is_dynamic() => Kind::Any,
            other => {
                self.error(
                    ErrorCode::NOT_INDEXABLE,
                    format!("type {other} does not support indexing"),
                    span,
                );
                Kind::Unknown
            }
        }
    }

    fn member_kind(&mut self, target: &Kind, name: &str, span: Span) -> Kind {
        match target {
            Kind::Map(value) => (**value).clone(),
            Kind::Record(fields) => fields.get(name).cloned().unwrap_or(Kind::Any),
            k if k.is_dynamic() => Kind::Any,
            other => {
                self.error(
                    ErrorCode::UNKNOWN_MEMBER,
                    format!("type {other} has no field {name}"),
                    span,
                );
                Kind::Unknown
            }
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn check_call(&mut self, callee: &mut Expr, args: &mut [Expr], span: Span) -> Kind {
        // Built-ins win over environment names of the same spelling.
        if let ExprKind::Identifier(name) = &callee.kind {
            if let Some(builtin) = self.registry.get(name) {
                callee.ty = Kind::func(Signature::any());
                return self.check_builtin_call(builtin, args, span);
            }
        }

        if let ExprKind::Member { target, name } = &mut callee.kind {
            let target_kind = self.check_expr(target);
            if let Some(sig) = methods::signature_for(&target_kind, name) {
                let name = name.clone();
                callee.ty = Kind::func(sig.clone());
                return self.check_call_against_sig(&name, &sig, args, span);
            }
            if matches!(target_kind, Kind::Time | Kind::Duration) {
                self.error(
                    ErrorCode::UNKNOWN_MEMBER,
                    format!("type {target_kind} has no method {name}"),
                    callee.span,
                );
                self.check_args(args);
                return Kind::Unknown;
            }
            let member = self.member_kind(&target_kind, name, callee.span);
            callee.ty = member.clone();
            let name = name.clone();
            return self.call_kind(&name, &member, args, span);
        }

        let callee_kind = self.check_expr(callee);
        let name = match &callee.kind {
            ExprKind::Identifier(name) => name.clone(),
            _ => callee_kind.to_string(),
        };
        self.call_kind(&name, &callee_kind, args, span)
    }

    /// Call through a value of kind `kind`.
    fn call_kind(&mut self, name: &str, kind: &Kind, args: &mut [Expr], span: Span) -> Kind {
        match kind {
            Kind::Func(sig) => self.check_call_against_sig(name, sig, args, span),
            k if k.is_dynamic() => {
                self.check_args(args);
                Kind::Any
            }
            other => {
                self.error(
                    ErrorCode::NOT_CALLABLE,
                    format!("{name} is not callable (type {other})"),
                    span,
                );
                self.check_args(args);
                Kind::Unknown
            }
        }
    }

    fn check_args(&mut self, args: &mut [Expr]) {
        for arg in args {
            self.check_expr(arg);
        }
    }

    fn check_builtin_call(&mut self, builtin: &Builtin, args: &mut [Expr], span: Span) -> Kind {
        if let Err(message) = builtin.check_arity(args.len()) {
            self.error(ErrorCode::WRONG_ARG_COUNT, message, span);
            self.check_args(args);
            return Kind::Unknown;
        }

        let infos = if builtin.is_higher_order() {
            self.check_predicate_args(args)
        } else {
            args.iter_mut()
                .map(|arg| {
                    let kind = self.check_expr(arg);
                    match literal_value(arg) {
                        Some(value) => ArgInfo::constant(value),
                        None => ArgInfo::new(kind),
                    }
                })
                .collect()
        };

        match builtin.kind_of_call(&infos) {
            Ok(kind) => kind,
            Err(message) => {
                self.error(ErrorCode::INVALID_ARGUMENT, message, span);
                Kind::Unknown
            }
        }
    }

    /// `map(seq, pred)` / `filter(seq, pred)`: the predicate is checked with
    /// `#` bound to the element kind of `seq`.
    fn check_predicate_args(&mut self, args: &mut [Expr]) -> Vec<ArgInfo> {
        let mut infos = Vec::with_capacity(args.len());
        let mut iter = args.iter_mut();
        if let Some(seq) = iter.next() {
            let seq_kind = self.check_expr(seq);
            let element = seq_kind.element();
            infos.push(ArgInfo::new(seq_kind));
            if let Some(pred) = iter.next() {
                self.env.push_predicate(element);
                let pred_kind = self.check_expr(pred);
                self.env.pop_predicate();
                infos.push(ArgInfo::new(pred_kind));
            }
        }
        infos
    }

    fn check_call_against_sig(
        &mut self,
        name: &str,
        sig: &Signature,
        args: &mut [Expr],
        span: Span,
    ) -> Kind {
        if args.len() < sig.params.len() {
            self.error(
                ErrorCode::WRONG_ARG_COUNT,
                format!("not enough arguments to call {name}"),
                span,
            );
        } else if sig.variadic.is_none() && args.len() > sig.params.len() {
            self.error(
                ErrorCode::WRONG_ARG_COUNT,
                format!("too many arguments to call {name}"),
                span,
            );
        }

        for (i, arg) in args.iter_mut().enumerate() {
            let arg_kind = self.check_expr(arg);
            if let Some(expected) = sig.param(i) {
                if !arg_kind.is_assignable_to(expected) {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("cannot use {arg_kind} as argument (type {expected}) to call {name}"),
                        arg.span,
                    );
                }
            }
        }

        sig.ret.clone()
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn check_unary(&mut self, op: UnaryOp, operand: &mut Expr, span: Span) -> Kind {
        let kind = self.check_expr(operand);
        match op {
            UnaryOp::Not => Kind::Bool,
            UnaryOp::Neg => match kind {
                Kind::Int | Kind::Float | Kind::Duration => kind,
                k if k.is_dynamic() => Kind::Any,
                other => {
                    self.error(
                        ErrorCode::TYPE_MISMATCH,
                        format!("invalid operation: - (mismatched type {other})"),
                        span,
                    );
                    Kind::Unknown
                }
            },
        }
    }

    fn check_binary(&mut self, left: &mut Expr, op: BinOp, right: &mut Expr, span: Span) -> Kind {
        let l = self.check_expr(left);
        let r = self.check_expr(right);

        let result = match op {
            BinOp::Coalesce => Some(match l {
                Kind::Nil => r.clone(),
                _ => l.unify(&r),
            }),
            BinOp::And | BinOp::Or => Some(match (&l, &r) {
                (Kind::Bool, Kind::Bool) => Kind::Bool,
                _ => l.unify(&r),
            }),
            BinOp::Eq | BinOp::NotEq => Some(Kind::Bool),
            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                comparable(&l, &r).then_some(Kind::Bool)
            }
            BinOp::In => (r.is_array() || r.is_map()).then_some(Kind::Bool),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
                arithmetic_kind(op, &l, &r)
            }
        };

        result.unwrap_or_else(|| {
            self.error(
                ErrorCode::TYPE_MISMATCH,
                format!(
                    "invalid operation: {} (mismatched types {l} and {r})",
                    op.as_str()
                ),
                span,
            );
            Kind::Unknown
        })
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    fn error(&mut self, code: ErrorCode, message: String, span: Span) {
        let source_line = self.source.line(span.line).unwrap_or("").to_string();
        self.errors.push_error(Diagnostic::new(
            &self.source.name,
            code,
            message,
            span,
            source_line,
        ));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Kind rules for operators
// ══════════════════════════════════════════════════════════════════════════════

fn comparable(l: &Kind, r: &Kind) -> bool {
    if l.is_dynamic() || r.is_dynamic() {
        return true;
    }
    matches!(
        (l, r),
        (Kind::Int | Kind::Float, Kind::Int | Kind::Float)
            | (Kind::String, Kind::String)
            | (Kind::Time, Kind::Time)
            | (Kind::Duration, Kind::Duration)
    )
}

/// Result kind of an arithmetic operator, or `None` if the operands do not
/// support it.
fn arithmetic_kind(op: BinOp, l: &Kind, r: &Kind) -> Option<Kind> {
    use Kind::*;

    if op == BinOp::Pow {
        return (l.is_numeric() && r.is_numeric()).then_some(Float);
    }
    if l.is_dynamic() || r.is_dynamic() {
        return Some(Any);
    }
    let kind = match (op, l, r) {
        (_, Int, Int) => Int,
        (_, Int | Float, Int | Float) => Float,
        (BinOp::Add, String, String) => String,
        (BinOp::Add, Time, Duration) | (BinOp::Add, Duration, Time) => Time,
        (BinOp::Add | BinOp::Sub, Duration, Duration) => Duration,
        (BinOp::Sub, Time, Time) => Duration,
        (BinOp::Sub, Time, Duration) => Time,
        _ => return None,
    };
    Some(kind)
}

/// The value of a literal argument, for kind rules that depend on it.
fn literal_value(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::IntLit(n) => Some(Value::Int(*n)),
        ExprKind::FloatLit(f) => Some(Value::Float(*f)),
        ExprKind::StringLit(s) => Some(Value::String(s.clone())),
        ExprKind::BoolLit(b) => Some(Value::Bool(*b)),
        _ => None,
    }
}
