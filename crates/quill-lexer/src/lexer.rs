//! Core Quill lexer — converts source text to a token stream.
//!
//! Features:
//! - Integer, float (`.5`, `1e3`, `1_000`), and single/double-quoted string literals
//! - `// line` and `/* block */` comments skipped
//! - `$env` sigil identifier and the `#` placeholder
//! - The pipe operator `|` only when pipes are enabled
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use quill_types::{CompileErrors, Diagnostic, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The Quill lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`quill_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    /// Whether `|` lexes as the pipe operator.
    pipes: bool,
    /// Collected errors.
    errors: CompileErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: CompileErrors,
}

/// Where a token started.
#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    col: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            pipes: false,
            errors: CompileErrors::empty(),
        }
    }

    /// Enable or disable the experimental pipe operator.
    pub fn with_pipes(mut self, enabled: bool) -> Self {
        self.pipes = enabled;
        self
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= quill_types::MAX_ERRORS {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let mark = self.mark();
            tokens.push(Token::new(TokenKind::Eof, self.span_from(mark)));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span::new(mark.pos as u32, self.pos as u32, mark.line, mark.col)
    }

    fn token(&self, kind: TokenKind, mark: Mark) -> Token {
        Token::new(kind, self.span_from(mark))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("").to_string();
        let err = Diagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments. Newlines are insignificant.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let mark = self.mark();
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(mark);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "unterminated block comment",
                        span,
                    );
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token.
    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        let mark = self.mark();
        // If we've hit the error cap, stop immediately
        if self.errors.total_errors >= quill_types::MAX_ERRORS {
            return self.token(TokenKind::Eof, mark);
        }
        let Some(ch) = self.advance() else {
            return self.token(TokenKind::Eof, mark);
        };

        match ch {
            // ── Literals ──
            '"' | '\'' => self.scan_string(ch, mark),
            '0'..='9' => self.scan_number(mark),
            '.' if matches!(self.peek(), Some('0'..='9')) => self.scan_number(mark),

            // ── Names ──
            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(mark),
            '$' => self.scan_sigil(mark),
            '#' => self.token(TokenKind::Hash, mark),

            // ── Operators ──
            '+' => self.token(TokenKind::Plus, mark),
            '-' => self.token(TokenKind::Minus, mark),
            '/' => self.token(TokenKind::Slash, mark),
            '%' => self.token(TokenKind::Percent, mark),
            '*' => {
                let kind = if self.eat('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                };
                self.token(kind, mark)
            }
            '=' => {
                if self.eat('=') {
                    self.token(TokenKind::EqEq, mark)
                } else {
                    self.unexpected(ch, mark)
                }
            }
            '!' => {
                let kind = if self.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                };
                self.token(kind, mark)
            }
            '<' => {
                let kind = if self.eat('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                };
                self.token(kind, mark)
            }
            '>' => {
                let kind = if self.eat('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                };
                self.token(kind, mark)
            }
            '&' => {
                if self.eat('&') {
                    self.token(TokenKind::AmpAmp, mark)
                } else {
                    self.unexpected(ch, mark)
                }
            }
            '|' => {
                if self.eat('|') {
                    self.token(TokenKind::PipePipe, mark)
                } else if self.pipes {
                    self.token(TokenKind::Pipe, mark)
                } else {
                    let span = self.span_from(mark);
                    self.emit_error(
                        ErrorCode::PIPES_DISABLED,
                        "unexpected token '|' (pipes are not enabled)",
                        span,
                    );
                    self.scan_token()
                }
            }
            '?' => {
                let kind = if self.eat('?') {
                    TokenKind::QuestionQuestion
                } else {
                    TokenKind::Question
                };
                self.token(kind, mark)
            }
            '.' => {
                let kind = if self.eat('.') {
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                };
                self.token(kind, mark)
            }

            // ── Punctuation ──
            '(' => self.token(TokenKind::LParen, mark),
            ')' => self.token(TokenKind::RParen, mark),
            '[' => self.token(TokenKind::LBracket, mark),
            ']' => self.token(TokenKind::RBracket, mark),
            '{' => self.token(TokenKind::LBrace, mark),
            '}' => self.token(TokenKind::RBrace, mark),
            ',' => self.token(TokenKind::Comma, mark),
            ':' => self.token(TokenKind::Colon, mark),

            _ => self.unexpected(ch, mark),
        }
    }

    /// Report an unexpected character and keep scanning after it.
    fn unexpected(&mut self, ch: char, mark: Mark) -> Token {
        let span = self.span_from(mark);
        self.emit_error(
            ErrorCode::UNEXPECTED_CHARACTER,
            format!("unexpected character '{ch}'"),
            span,
        );
        self.scan_token()
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, mark: Mark) -> Token {
        // The first digit (or a leading `.`) was already consumed.
        let mut is_float = self.source[mark.pos..].starts_with('.');
        self.skip_digits();

        // `1..9` is a range, not a float.
        if !is_float && self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            is_float = true;
            self.advance();
            self.skip_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek_at(1), Some('+' | '-')) {
                2
            } else {
                1
            };
            if matches!(self.peek_at(digit_at), Some('0'..='9')) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text: String = self.source[mark.pos..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let span = self.span_from(mark);

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::new(TokenKind::FloatLit(value), span),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("invalid float literal {text}"),
                        span,
                    );
                    Token::new(TokenKind::FloatLit(0.0), span)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::IntLit(value), span),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("integer literal {text} out of range"),
                        span,
                    );
                    Token::new(TokenKind::IntLit(0), span)
                }
            }
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9' | '_')) {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, mark: Mark) -> Token {
        while matches!(self.peek(), Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_')) {
            self.advance();
        }
        let word = &self.source[mark.pos..self.pos];
        let kind = TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()));
        self.token(kind, mark)
    }

    /// `$env` is the only sigil identifier.
    fn scan_sigil(&mut self, mark: Mark) -> Token {
        while matches!(self.peek(), Some('a'..='z' | 'A'..='Z' | '0'..='9' | '_')) {
            self.advance();
        }
        let word = &self.source[mark.pos..self.pos];
        if word == "$env" {
            return self.token(TokenKind::Identifier(word.to_string()), mark);
        }
        let span = self.span_from(mark);
        let message = format!("unexpected token '{word}'");
        self.emit_error(ErrorCode::UNEXPECTED_CHARACTER, message, span);
        self.scan_token()
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self, quote: char, mark: Mark) -> Token {
        let mut value = String::new();
        loop {
            let Some(ch) = self.advance() else {
                let span = self.span_from(mark);
                self.emit_error(
                    ErrorCode::UNTERMINATED_STRING,
                    "unterminated string literal",
                    span,
                );
                break;
            };
            if ch == quote {
                break;
            }
            if ch == '\\' {
                if let Some(escaped) = self.scan_escape() {
                    value.push(escaped);
                }
            } else {
                value.push(ch);
            }
        }
        self.token(TokenKind::StringLit(value), mark)
    }

    /// Resolve one escape sequence; the backslash was already consumed.
    fn scan_escape(&mut self) -> Option<char> {
        let mark = self.mark();
        let ch = self.advance()?;
        let resolved = match ch {
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            '\\' | '\'' | '"' => Some(ch),
            'x' => self.scan_hex_escape(2),
            'u' => self.scan_hex_escape(4),
            'U' => self.scan_hex_escape(8),
            '0'..='7' => self.scan_octal_escape(ch),
            _ => None,
        };
        if resolved.is_none() {
            let span = self.span_from(mark);
            let text = &self.source[mark.pos..self.pos];
            self.emit_error(
                ErrorCode::INVALID_ESCAPE,
                format!("invalid escape sequence '\\{text}'"),
                span,
            );
        }
        resolved
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self.peek().and_then(|c| c.to_digit(16))?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }

    fn scan_octal_escape(&mut self, first: char) -> Option<char> {
        let mut code = first.to_digit(8)?;
        for _ in 0..2 {
            let digit = self.peek().and_then(|c| c.to_digit(8))?;
            self.advance();
            code = code * 8 + digit;
        }
        char::from_u32(code).filter(|_| code <= 0xFF)
    }
}

/// Convenience: lex a source file with default settings.
pub fn lex(source_file: &SourceFile) -> LexResult {
    Lexer::new(source_file).lex()
}
