//! Core expression evaluator.

use chrono::TimeDelta;
use indexmap::IndexMap;
use quill_stdlib::methods::{add_duration, since, sub_duration};
use quill_stdlib::{builtins, Builtin, BuiltinRegistry, Env, StdlibError, Value};
use quill_types::ast::*;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};

/// Largest array a range may produce.
pub const MAX_RANGE_LEN: i128 = 1_000_000;

/// Walks a checked tree and produces a [`Value`].
pub struct Evaluator<'a> {
    env: Environment<'a>,
    registry: &'static BuiltinRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(globals: &'a Env) -> Self {
        Self {
            env: Environment::new(globals),
            registry: builtins(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a Value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(Value::Int(*n)),
            ExprKind::FloatLit(f) => Ok(Value::Float(*f)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NilLit => Ok(Value::Nil),

            ExprKind::ArrayLit(items) => self.eval_args(items).map(Value::Array),
            ExprKind::MapLit(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for entry in entries {
                    let value = self.eval_expr(&entry.value)?;
                    map.insert(entry.key.clone(), value);
                }
                Ok(Value::Map(map))
            }

            ExprKind::Identifier(name) => self.eval_identifier(name),
            ExprKind::Placeholder => self
                .env
                .placeholder()
                .cloned()
                .ok_or(EvalError::PlaceholderOutsidePredicate),

            ExprKind::Index { target, key } => {
                let target = self.eval_expr(target)?;
                let key = self.eval_expr(key)?;
                Ok(target.index(&key)?)
            }
            ExprKind::Member { target, name } => Ok(self.eval_expr(target)?.get_field(name)?),
            ExprKind::Call { callee, args } => self.eval_call(callee, args),

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Range { low, high } => self.eval_range(low, high),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(otherwise)
                }
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    fn eval_identifier(&self, name: &str) -> EvalResult<Value> {
        if name == "$env" {
            return Ok(self.env.as_value());
        }
        self.env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownName(name.to_string()))
    }

    // ── Calls ────────────────────────────────────────────────────────────

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        match &callee.kind {
            ExprKind::Identifier(name) => {
                if let Some(builtin) = self.registry.get(name) {
                    return self.call_builtin(builtin, args);
                }
                let func = self.eval_identifier(name)?;
                let args = self.eval_args(args)?;
                call_value(name, &func, &args)
            }
            ExprKind::Member { target, name } => {
                let receiver = self.eval_expr(target)?;
                let args = self.eval_args(args)?;
                match &receiver {
                    Value::Map(_) => call_value(name, &receiver.get_field(name)?, &args),
                    _ => Ok(receiver.call_method(name, &args)?),
                }
            }
            _ => {
                let func = self.eval_expr(callee)?;
                let args = self.eval_args(args)?;
                call_value(func.type_name(), &func, &args)
            }
        }
    }

    fn call_builtin(&mut self, builtin: &Builtin, args: &[Expr]) -> EvalResult<Value> {
        if builtin.is_higher_order() {
            builtin.check_arity(args.len()).map_err(StdlibError::Arity)?;
            return match args {
                [seq, pred] => self.eval_predicate(builtin.name, seq, pred),
                _ => Err(StdlibError::Arity(format!("invalid arguments to {}", builtin.name)).into()),
            };
        }
        let values = self.eval_args(args)?;
        Ok(self.registry.call(builtin.name, &values)?)
    }

    /// `map` / `filter`: evaluate `pred` once per element with `#` bound.
    fn eval_predicate(&mut self, owner: &str, seq: &Expr, pred: &Expr) -> EvalResult<Value> {
        let keep_matching = match owner {
            "map" => false,
            "filter" => true,
            other => {
                return Err(StdlibError::runtime(format!("{other} does not take a predicate")).into())
            }
        };
        let items = match self.eval_expr(seq)? {
            Value::Array(items) => items,
            other => return Err(StdlibError::invalid_argument(owner, other.type_name()).into()),
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            self.env.push_placeholder(item.clone());
            let result = self.eval_expr(pred);
            self.env.pop_placeholder();
            let result = result?;
            if !keep_matching {
                out.push(result);
            } else if result.is_truthy() {
                out.push(item);
            }
        }
        Ok(Value::Array(out))
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval_expr(operand)?;
        match (op, &val) {
            (UnaryOp::Not, _) => Ok(Value::Bool(!val.is_truthy())),
            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::IntegerOverflow("-")),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Neg, Value::Duration(d)) => Ok(Value::Duration(-*d)),
            (UnaryOp::Neg, other) => Err(EvalError::UnaryMismatch {
                op: op.as_str(),
                operand: other.type_name().to_string(),
            }),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        match op {
            // `&&` / `||` return the operand that decided the result.
            BinOp::And => {
                let lv = self.eval_expr(left)?;
                if lv.is_truthy() {
                    self.eval_expr(right)
                } else {
                    Ok(lv)
                }
            }
            BinOp::Or => {
                let lv = self.eval_expr(left)?;
                if lv.is_truthy() {
                    Ok(lv)
                } else {
                    self.eval_expr(right)
                }
            }
            BinOp::Coalesce => match self.eval_expr(left) {
                Ok(lv) if !lv.is_nil() => Ok(lv),
                _ => self.eval_expr(right),
            },
            _ => {
                let lv = self.eval_expr(left)?;
                let rv = self.eval_expr(right)?;
                apply_binary(op, &lv, &rv)
            }
        }
    }

    fn eval_range(&mut self, low: &Expr, high: &Expr) -> EvalResult<Value> {
        let low = self.eval_expr(low)?;
        let high = self.eval_expr(high)?;
        let (a, b) = match (&low, &high) {
            (Value::Int(a), Value::Int(b)) => (*a, *b),
            (Value::Int(_), other) | (other, _) => {
                return Err(EvalError::RangeBounds(other.type_name().to_string()))
            }
        };
        if i128::from(b) - i128::from(a) >= MAX_RANGE_LEN {
            return Err(EvalError::MemoryBudget);
        }
        Ok(Value::Array((a..=b).map(Value::Int).collect()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Strict binary operators
// ══════════════════════════════════════════════════════════════════════════════

fn call_value(name: &str, func: &Value, args: &[Value]) -> EvalResult<Value> {
    match func {
        Value::Func(f) => Ok(f.call(args)?),
        other => Err(EvalError::NotCallable {
            name: name.to_string(),
            type_name: other.type_name().to_string(),
        }),
    }
}

fn mismatch(op: BinOp, lv: &Value, rv: &Value) -> EvalError {
    EvalError::Mismatch {
        op: op.as_str(),
        left: lv.type_name().to_string(),
        right: rv.type_name().to_string(),
    }
}

/// Operators that evaluate both operands.
fn apply_binary(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    match op {
        BinOp::Add => eval_add(lv, rv),
        BinOp::Sub => eval_sub(lv, rv),
        BinOp::Mul | BinOp::Div | BinOp::Mod => eval_arith(op, lv, rv),
        BinOp::Pow => match (lv.as_f64(), rv.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
            _ => Err(mismatch(op, lv, rv)),
        },
        BinOp::Eq => Ok(Value::Bool(lv.loose_eq(rv))),
        BinOp::NotEq => Ok(Value::Bool(!lv.loose_eq(rv))),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            eval_comparison(op, lv, rv)
        }
        BinOp::In => eval_in(lv, rv),
        // Lazy operators never reach here.
        BinOp::And | BinOp::Or | BinOp::Coalesce => Err(mismatch(op, lv, rv)),
    }
}

fn eval_add(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::Time(t), Value::Duration(d)) | (Value::Duration(d), Value::Time(t)) => {
            Ok(Value::Time(add_duration(t, *d)?))
        }
        (Value::Duration(a), Value::Duration(b)) => duration_result(a.checked_add(b)),
        _ => eval_arith(BinOp::Add, lv, rv),
    }
}

fn eval_sub(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Time(a), Value::Time(b)) => Ok(Value::Duration(since(a, b))),
        (Value::Time(t), Value::Duration(d)) => Ok(Value::Time(sub_duration(t, *d)?)),
        (Value::Duration(a), Value::Duration(b)) => duration_result(a.checked_sub(b)),
        _ => eval_arith(BinOp::Sub, lv, rv),
    }
}

fn duration_result(d: Option<TimeDelta>) -> EvalResult<Value> {
    d.map(Value::Duration)
        .ok_or_else(|| StdlibError::runtime("duration out of range").into())
}

/// Numeric `+ - * / %`: two ints stay int, anything mixed becomes float.
fn eval_arith(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (lv, rv) {
        return int_arith(op, *a, *b);
    }
    let (Some(a), Some(b)) = (lv.as_f64(), rv.as_f64()) else {
        return Err(mismatch(op, lv, rv));
    };
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        _ => return Err(mismatch(op, lv, rv)),
    };
    Ok(Value::Float(result))
}

fn int_arith(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div | BinOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        // Truncates toward zero; the remainder takes the dividend's sign.
        BinOp::Div => a.checked_div(b),
        BinOp::Mod => a.checked_rem(b),
        _ => return Err(mismatch(op, &Value::Int(a), &Value::Int(b))),
    };
    result
        .map(Value::Int)
        .ok_or(EvalError::IntegerOverflow(op.as_str()))
}

fn eval_comparison(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    let ordering = match (lv, rv) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        (Value::Duration(a), Value::Duration(b)) => a.cmp(b),
        _ => match (lv.as_f64(), rv.as_f64()) {
            (Some(a), Some(b)) => match a.partial_cmp(&b) {
                Some(ordering) => ordering,
                // NaN compares false with everything.
                None => return Ok(Value::Bool(false)),
            },
            _ => return Err(mismatch(op, lv, rv)),
        },
    };
    let result = match op {
        BinOp::Less => ordering.is_lt(),
        BinOp::Greater => ordering.is_gt(),
        BinOp::LessEq => ordering.is_le(),
        BinOp::GreaterEq => ordering.is_ge(),
        _ => return Err(mismatch(op, lv, rv)),
    };
    Ok(Value::Bool(result))
}

fn eval_in(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (_, Value::Array(items)) => Ok(Value::Bool(items.iter().any(|i| i.loose_eq(lv)))),
        (Value::String(key), Value::Map(entries)) => Ok(Value::Bool(entries.contains_key(key))),
        (_, Value::Nil) => Ok(Value::Bool(false)),
        _ => Err(mismatch(BinOp::In, lv, rv)),
    }
}
