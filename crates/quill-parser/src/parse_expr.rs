//! Expression parsing with binding powers.
//!
//! Precedence (lowest → highest):
//! 1. `? :` (conditional)
//! 2. `|` (pipe, desugared to a call)
//! 3. `??`
//! 4. `||`, `or`
//! 5. `&&`, `and`
//! 6. `==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`
//! 7. `..`
//! 8. `+`, `-`
//! 9. `*`, `/`, `%`
//! 10. `**` (right-associative)
//! 11. unary `-`, `!`, `not`
//! 12. call `()`, index `[]`, member `.`

use quill_lexer::token::TokenKind;
use quill_types::ast::*;
use quill_types::{ErrorCode, Span};

use crate::parser::Parser;

/// An infix operator recognised by the binding-power loop.
#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinOp),
    NotIn,
    Range,
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a full expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_conditional()
    }

    /// The right-hand side of a pipe must be `name(args...)`.
    fn parse_pipe_target(&mut self, input: Expr) -> Option<Expr> {
        let is_call = self.look_ahead(1) == &TokenKind::LParen;
        let name = match self.peek_kind().clone() {
            TokenKind::Identifier(name) if is_call => name,
            _ => {
                self.error_at_current(
                    ErrorCode::INVALID_PIPE_TARGET,
                    format!(
                        "expected function call after '|', got '{}'",
                        self.peek_kind()
                    ),
                );
                return None;
            }
        };
        let name_span = self.advance();
        self.advance(); // `(`
        let mut args = vec![input];
        let close = self.parse_arguments(&mut args)?;

        let callee = Expr::new(ExprKind::Identifier(name), name_span);
        let span = args[0].span.merge(close);
        Some(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Conditional
    // ══════════════════════════════════════════════════════════════════════════

    /// `Conditional = Binary [ "?" Conditional ":" Conditional ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        self.nested(|p| {
            let cond = p.parse_binary(0)?;
            if !p.eat(&TokenKind::Question) {
                return Some(cond);
            }
            let then = p.parse_conditional()?;
            p.expect(&TokenKind::Colon)?;
            let otherwise = p.parse_conditional()?;
            let span = cond.span.merge(otherwise.span);
            Some(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                span,
            ))
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Binary Operators
    // ══════════════════════════════════════════════════════════════════════════

    /// Binding power loop: parses operators whose left power is at least `min_bp`.
    fn parse_binary(&mut self, min_bp: u8) -> Option<Expr> {
        self.nested(|p| {
            let mut left = p.parse_unary()?;
            loop {
                // `x | f(a, b)` becomes `f(x, a, b)`; the call is the left
                // operand of whatever follows.
                if p.check_exact(&TokenKind::Pipe) {
                    if min_bp > 0 {
                        break;
                    }
                    if !p.deepen() {
                        return None;
                    }
                    p.advance();
                    left = p.parse_pipe_target(left)?;
                    continue;
                }
                let Some((op, left_bp, right_bp, width)) = p.infix_op() else {
                    break;
                };
                if left_bp < min_bp {
                    break;
                }
                if !p.deepen() {
                    return None;
                }
                for _ in 0..width {
                    p.advance();
                }
                let right = p.parse_binary(right_bp)?;
                left = Self::make_infix(op, left, right);
            }
            Some(left)
        })
    }

    /// Operator at the cursor with its binding powers and token width.
    fn infix_op(&self) -> Option<(Infix, u8, u8, usize)> {
        let (op, bp, right_assoc) = match self.peek_kind() {
            TokenKind::QuestionQuestion => (Infix::Binary(BinOp::Coalesce), 1, false),
            TokenKind::PipePipe | TokenKind::Or => (Infix::Binary(BinOp::Or), 2, false),
            TokenKind::AmpAmp | TokenKind::And => (Infix::Binary(BinOp::And), 3, false),
            TokenKind::EqEq => (Infix::Binary(BinOp::Eq), 4, false),
            TokenKind::BangEq => (Infix::Binary(BinOp::NotEq), 4, false),
            TokenKind::Less => (Infix::Binary(BinOp::Less), 4, false),
            TokenKind::LessEq => (Infix::Binary(BinOp::LessEq), 4, false),
            TokenKind::Greater => (Infix::Binary(BinOp::Greater), 4, false),
            TokenKind::GreaterEq => (Infix::Binary(BinOp::GreaterEq), 4, false),
            TokenKind::In => (Infix::Binary(BinOp::In), 4, false),
            TokenKind::Not if self.look_ahead(1) == &TokenKind::In => {
                return Some((Infix::NotIn, 4, 5, 2));
            }
            TokenKind::DotDot => (Infix::Range, 5, false),
            TokenKind::Plus => (Infix::Binary(BinOp::Add), 6, false),
            TokenKind::Minus => (Infix::Binary(BinOp::Sub), 6, false),
            TokenKind::Star => (Infix::Binary(BinOp::Mul), 7, false),
            TokenKind::Slash => (Infix::Binary(BinOp::Div), 7, false),
            TokenKind::Percent => (Infix::Binary(BinOp::Mod), 7, false),
            TokenKind::StarStar => (Infix::Binary(BinOp::Pow), 8, true),
            _ => return None,
        };
        let right_bp = if right_assoc { bp } else { bp + 1 };
        Some((op, bp, right_bp, 1))
    }

    fn make_infix(op: Infix, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        match op {
            Infix::Binary(op) => Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            ),
            Infix::Range => Expr::new(
                ExprKind::Range {
                    low: Box::new(left),
                    high: Box::new(right),
                },
                span,
            ),
            Infix::NotIn => {
                let inner = Expr::new(
                    ExprKind::Binary {
                        left: Box::new(left),
                        op: BinOp::In,
                        right: Box::new(right),
                    },
                    span,
                );
                Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(inner),
                    },
                    span,
                )
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Unary & Postfix
    // ══════════════════════════════════════════════════════════════════════════

    /// `Unary = { "-" | "!" | "not" } Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        self.scoped(|p| {
            let mut prefixes: Vec<(UnaryOp, Span)> = Vec::new();
            loop {
                let op = match p.peek_kind() {
                    TokenKind::Minus => UnaryOp::Neg,
                    TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
                    _ => break,
                };
                if !p.deepen() {
                    return None;
                }
                prefixes.push((op, p.advance()));
            }

            let mut expr = p.parse_postfix()?;
            for (op, span) in prefixes.into_iter().rev() {
                let span = span.merge(expr.span);
                expr = Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(expr),
                    },
                    span,
                );
            }
            Some(expr)
        })
    }

    /// `Postfix = Primary { "(" Args ")" | "[" Expr "]" | "." Name }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        self.scoped(|p| {
            let mut expr = p.parse_primary()?;
            loop {
                if !matches!(
                    p.peek_kind(),
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot
                ) {
                    return Some(expr);
                }
                if !p.deepen() {
                    return None;
                }
                match p.peek_kind() {
                    TokenKind::LParen => {
                        p.advance();
                        let mut args = Vec::new();
                        let close = p.parse_arguments(&mut args)?;
                        let span = expr.span.merge(close);
                        expr = Expr::new(
                            ExprKind::Call {
                                callee: Box::new(expr),
                                args,
                            },
                            span,
                        );
                    }
                    TokenKind::LBracket => {
                        p.advance();
                        let key = p.parse_expression()?;
                        let close = p.expect(&TokenKind::RBracket)?;
                        let span = expr.span.merge(close);
                        expr = Expr::new(
                            ExprKind::Index {
                                target: Box::new(expr),
                                key: Box::new(key),
                            },
                            span,
                        );
                    }
                    _ => {
                        p.advance();
                        let name = p.expect_name()?;
                        let span = expr.span.merge(p.previous_span());
                        expr = Expr::new(
                            ExprKind::Member {
                                target: Box::new(expr),
                                name,
                            },
                            span,
                        );
                    }
                }
            }
        })
    }

    /// Parse comma-separated arguments after `(`, appending to `args`.
    /// Returns the span of the closing `)`.
    fn parse_arguments(&mut self, args: &mut Vec<Expr>) -> Option<Span> {
        while !self.check_exact(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::IntLit(n) => ExprKind::IntLit(n),
            TokenKind::FloatLit(n) => ExprKind::FloatLit(n),
            TokenKind::StringLit(s) => ExprKind::StringLit(s),
            TokenKind::True => ExprKind::BoolLit(true),
            TokenKind::False => ExprKind::BoolLit(false),
            TokenKind::Nil => ExprKind::NilLit,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),
            TokenKind::Hash => ExprKind::Placeholder,
            TokenKind::LParen => return self.parse_group(),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_map_literal(),
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected token '{other}'"),
                );
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, span))
    }

    /// `( expr )`
    fn parse_group(&mut self) -> Option<Expr> {
        let open = self.advance();
        let mut inner = self.parse_expression()?;
        let close = self.expect(&TokenKind::RParen)?;
        inner.span = open.merge(close);
        Some(inner)
    }

    /// `[ expr, ... ]` with an optional trailing comma.
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let open = self.advance();
        let mut items = Vec::new();
        while !self.check_exact(&TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(ExprKind::ArrayLit(items), open.merge(close)))
    }

    /// `{ key: expr, ... }` where keys are names or string literals.
    fn parse_map_literal(&mut self) -> Option<Expr> {
        let open = self.advance();
        let mut entries = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            let key_span = self.current_span();
            let key = match self.peek_kind().clone() {
                TokenKind::StringLit(s) => {
                    self.advance();
                    s
                }
                _ => self.expect_name()?,
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            let span = key_span.merge(value.span);
            entries.push(MapEntry { key, value, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RBrace)?;
        Some(Expr::new(ExprKind::MapLit(entries), open.merge(close)))
    }
}
