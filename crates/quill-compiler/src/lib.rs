//! Quill compiler: orchestrates the compile pipeline.
//!
//! ```text
//! Source → Lexer → Parser → Checker → Program
//! ```

pub mod checker;
pub mod descriptor;
pub mod env;
pub mod options;
pub mod program;
pub mod reference;

pub use checker::TypeChecker;
pub use descriptor::Descriptor;
pub use options::Options;
pub use program::Program;

use quill_types::{CompileErrors, Diagnostic, ErrorCode, SourceFile, Span};

/// Compile `source`, returning the first diagnostic on failure.
pub fn compile(source: &str, options: &Options) -> Result<Program, Diagnostic> {
    compile_all(source, options).map_err(|errors| {
        errors.into_first().unwrap_or_else(|| {
            Diagnostic::new(
                &options.file_name,
                ErrorCode::UNEXPECTED_TOKEN,
                "expected an expression",
                Span::default(),
                "",
            )
        })
    })
}

/// Compile `source`, returning every diagnostic on failure.
pub fn compile_all(source: &str, options: &Options) -> Result<Program, CompileErrors> {
    let source_file = SourceFile::new(options.file_name.clone(), source);
    let parsed = quill_parser::parse(&source_file, options.parse_options());
    let mut errors = parsed.errors;
    let Some(mut expr) = parsed.expr else {
        return Err(errors);
    };
    if errors.has_errors() {
        return Err(errors);
    }

    let kind = TypeChecker::new(&mut errors, &source_file, options.descriptor.as_ref())
        .check(&mut expr, options.expected.as_ref());
    if errors.has_errors() {
        tracing::debug!(errors = errors.total_errors, "compile failed");
        return Err(errors);
    }

    let program = Program::new(source, expr, options);
    tracing::debug!(
        len = source.len(),
        kind = %kind,
        fingerprint = program.fingerprint(),
        "compiled program"
    );
    Ok(program)
}
