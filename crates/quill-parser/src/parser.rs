//! Core parser infrastructure: token cursor, error reporting, helpers.

use quill_lexer::token::{Token, TokenKind};
use quill_types::ast::Expr;
use quill_types::{CompileErrors, Diagnostic, ErrorCode, SourceFile, Span};

/// Default maximum expression nesting depth.
pub const DEFAULT_MAX_DEPTH: u32 = 128;

/// The Quill parser.
///
/// Consumes a token stream produced by the lexer and builds an AST for a
/// single expression. Collects errors instead of panicking.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Collected errors.
    errors: CompileErrors,
    /// Current expression nesting depth.
    pub(crate) depth: u32,
    /// Maximum expression nesting depth.
    pub(crate) max_depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    /// The parsed expression, `None` when a syntax error stopped the parser.
    pub expr: Option<Expr>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole token stream as one expression.
    pub fn parse(mut self) -> ParseResult {
        let expr = self.parse_expression();
        if expr.is_some() && !self.at_end() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("unexpected token '{}'", self.peek_kind()),
            );
        }
        let expr = if self.errors.has_errors() { None } else { expr };
        ParseResult {
            expr,
            errors: self.errors,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_default()
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns its span if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect an identifier, or a keyword used as a name after `.` or as a
    /// map key (`{in: 1}`, `x.nil`).
    pub(crate) fn expect_name(&mut self) -> Option<String> {
        let kind = self.peek_kind().clone();
        match kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(name)
            }
            _ if kind.is_keyword() => {
                self.advance();
                Some(kind.to_string())
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected name, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Run `f` one nesting level deeper, failing once the limit is reached.
    /// Levels charged inside `f` are released when it returns.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if !self.deepen() {
            return None;
        }
        self.scoped(f)
    }

    /// Run `f`, then release any levels it charged.
    pub(crate) fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let base = self.depth;
        let result = f(self);
        self.depth = base;
        result
    }

    /// Charge one level of tree depth. Loops that fold nodes without
    /// recursing (operator chains, prefixes, postfixes) call this once per
    /// node, so the tree handed to later stages never exceeds `max_depth`.
    pub(crate) fn deepen(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.error_at_current(
                ErrorCode::NESTING_TOO_DEEP,
                format!("maximum expression nesting depth is {}", self.max_depth),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        // Only the first failure matters once the parser has bailed out.
        if self.errors.has_errors() {
            return;
        }
        let source_line = self.source_file.line(span.line).unwrap_or("").to_string();
        let error = Diagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(error);
    }
}
