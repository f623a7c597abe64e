//! Quill parser: converts a token stream into an AST.

mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser, DEFAULT_MAX_DEPTH};

use quill_lexer::Lexer;
use quill_types::SourceFile;

/// Parser settings that change what the source may contain.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Accept `x | f()`.
    pub pipes: bool,
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            pipes: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Lex and parse a source file in one step.
///
/// Lexical errors stop the pipeline before parsing.
pub fn parse(source_file: &SourceFile, options: ParseOptions) -> ParseResult {
    let lexed = Lexer::new(source_file).with_pipes(options.pipes).lex();
    if lexed.errors.has_errors() {
        return ParseResult {
            expr: None,
            errors: lexed.errors,
        };
    }
    Parser::new(lexed.tokens, source_file)
        .with_max_depth(options.max_depth)
        .parse()
}
