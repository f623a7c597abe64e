//! Checker integration tests.
//!
//! Each test compiles a source expression through `quill_compiler::compile`
//! and asserts on the result kind or on the first diagnostic.

use quill_compiler::{compile, compile_all, Descriptor, Options, Program};
use quill_stdlib::{Env, Value};
use quill_types::{Diagnostic, ErrorCode, Kind, Signature};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn sample_env() -> Env {
    Env::new()
        .with("num", 42)
        .with("str", "foo")
        .with("ArrayOfString", vec!["foo", "bar", "baz"])
        .with("ArrayOfInt", vec![1, 2, 3])
}

fn compile_ok(source: &str, options: &Options) -> Program {
    match compile(source, options) {
        Ok(program) => program,
        Err(err) => panic!("{source}: unexpected error: {err}"),
    }
}

fn kind_of(source: &str) -> Kind {
    compile_ok(source, &Options::new().env(&sample_env()))
        .kind()
        .clone()
}

fn compile_err(source: &str, options: &Options) -> Diagnostic {
    match compile(source, options) {
        Ok(program) => panic!("{source}: expected an error, got kind {}", program.kind()),
        Err(err) => err,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Result kinds
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_builtin_result_kinds() {
    let cases = [
        ("get(ArrayOfString, 0)", Kind::String),
        ("get(ArrayOfInt, 0)", Kind::Int),
        ("first(ArrayOfString)", Kind::String),
        ("first(ArrayOfInt)", Kind::Int),
        ("last(ArrayOfString)", Kind::String),
        ("last(ArrayOfInt)", Kind::Int),
        ("get($env, 'str')", Kind::String),
        ("get($env, 'num')", Kind::Int),
        ("get($env, 'ArrayOfString')", Kind::array(Kind::String)),
    ];
    for (source, want) in cases {
        assert_eq!(kind_of(source), want, "{source}");
    }
}

#[test]
fn test_operator_result_kinds() {
    let cases = [
        ("1 + 2", Kind::Int),
        ("1 + 2.5", Kind::Float),
        ("7 / 2", Kind::Int),
        ("2 ** 3", Kind::Float),
        ("num % 5", Kind::Int),
        ("'a' + str", Kind::String),
        ("num > 3 && num < 50", Kind::Bool),
        ("num in ArrayOfInt", Kind::Bool),
        ("1..10", Kind::array(Kind::Int)),
        ("[1, 2.5]", Kind::array(Kind::Float)),
        ("[]", Kind::array(Kind::Any)),
        ("num > 1 ? 'big' : 'small'", Kind::String),
        ("nil ?? 5", Kind::Int),
        ("-num", Kind::Int),
        ("!true", Kind::Bool),
        ("now() - now()", Kind::Duration),
        ("now() + duration('1h')", Kind::Time),
        ("now().Year()", Kind::Int),
        ("duration('90m').Hours()", Kind::Float),
        ("map(ArrayOfInt, # * 2)", Kind::array(Kind::Int)),
        ("filter(ArrayOfString, # != 'foo')", Kind::array(Kind::String)),
        ("map(ArrayOfString, len(#))", Kind::array(Kind::Int)),
        ("{a: 1, b: 'x'}.b", Kind::String),
        ("fromJSON('[1]')", Kind::Any),
    ];
    for (source, want) in cases {
        assert_eq!(kind_of(source), want, "{source}");
    }
}

#[test]
fn test_every_node_gets_a_kind() {
    let program = compile_ok("len(ArrayOfInt) + 1", &Options::new().env(&sample_env()));
    let quill_types::ast::ExprKind::Binary { left, right, .. } = &program.expr().kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(left.ty, Kind::Int);
    assert_eq!(right.ty, Kind::Int);
    assert_eq!(program.expr().ty, Kind::Int);
}

// ══════════════════════════════════════════════════════════════════════════════
// Built-in errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_builtin_check_errors() {
    let cases = [
        ("len()", "invalid number of arguments (expected 1, got 0)", ErrorCode::WRONG_ARG_COUNT),
        ("len(1)", "invalid argument for len (type int)", ErrorCode::INVALID_ARGUMENT),
        ("abs()", "invalid number of arguments (expected 1, got 0)", ErrorCode::WRONG_ARG_COUNT),
        ("abs(1, 2)", "invalid number of arguments (expected 1, got 2)", ErrorCode::WRONG_ARG_COUNT),
        ("abs(\"foo\")", "invalid argument for abs (type string)", ErrorCode::INVALID_ARGUMENT),
        ("int()", "invalid number of arguments (expected 1, got 0)", ErrorCode::WRONG_ARG_COUNT),
        ("float(1, 2)", "invalid number of arguments (expected 1, got 2)", ErrorCode::WRONG_ARG_COUNT),
        ("string(1, 2)", "too many arguments to call string", ErrorCode::WRONG_ARG_COUNT),
        ("trim()", "not enough arguments to call trim", ErrorCode::WRONG_ARG_COUNT),
        ("max()", "not enough arguments to call max", ErrorCode::WRONG_ARG_COUNT),
        ("max(1, \"2\")", "invalid argument for max (type string)", ErrorCode::INVALID_ARGUMENT),
        ("min(1, \"2\")", "invalid argument for min (type string)", ErrorCode::INVALID_ARGUMENT),
        ("get()", "invalid number of arguments (expected 2, got 0)", ErrorCode::WRONG_ARG_COUNT),
        ("get(1, 2)", "type int does not support indexing", ErrorCode::INVALID_ARGUMENT),
        ("join([1, 2])", "invalid argument for join (type array)", ErrorCode::INVALID_ARGUMENT),
    ];
    for (source, message, code) in cases {
        let err = compile_err(source, &Options::new());
        assert_eq!(err.message, message, "{source}");
        assert_eq!(err.code, code, "{source}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Names, placeholders and members
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_unknown_name_with_descriptor() {
    let err = compile_err("missing + 1", &Options::new().env(&sample_env()));
    assert_eq!(err.code, ErrorCode::UNKNOWN_NAME);
    assert_eq!(err.message, "unknown name missing");
    assert_eq!((err.span.line, err.span.column), (1, 1));
}

#[test]
fn test_unknown_name_without_descriptor_is_any() {
    let program = compile_ok("missing + 1", &Options::new());
    assert_eq!(program.kind(), &Kind::Any);
}

#[test]
fn test_builtins_shadow_environment_names() {
    let env = Env::new().with("len", 3);
    assert_eq!(
        compile_ok("len('abc')", &Options::new().env(&env)).kind(),
        &Kind::Int
    );
}

#[test]
fn test_placeholder_outside_predicate() {
    let err = compile_err("# + 1", &Options::new());
    assert_eq!(err.code, ErrorCode::PLACEHOLDER_OUTSIDE_PREDICATE);

    let err = compile_err("len(#)", &Options::new());
    assert_eq!(err.code, ErrorCode::PLACEHOLDER_OUTSIDE_PREDICATE);
}

#[test]
fn test_nested_placeholders_shadow() {
    let desc = Descriptor::new().with("matrix", Kind::array(Kind::array(Kind::String)));
    let program = compile_ok("map(matrix, map(#, len(#)))", &Options::new().descriptor(desc));
    assert_eq!(program.kind(), &Kind::array(Kind::array(Kind::Int)));
}

#[test]
fn test_unknown_time_method() {
    let err = compile_err("now().Nope()", &Options::new());
    assert_eq!(err.code, ErrorCode::UNKNOWN_MEMBER);
    assert_eq!(err.message, "type time has no method Nope");
}

#[test]
fn test_indexing_rules() {
    let options = Options::new().env(&sample_env());
    assert_eq!(compile_ok("ArrayOfInt[-1]", &options).kind(), &Kind::Int);
    assert_eq!(compile_ok("$env['str']", &options).kind(), &Kind::String);

    let err = compile_err("num[0]", &options);
    assert_eq!(err.code, ErrorCode::NOT_INDEXABLE);
    assert_eq!(err.message, "type int does not support indexing");

    let err = compile_err("ArrayOfInt['a']", &options);
    assert_eq!(err.code, ErrorCode::TYPE_MISMATCH);
}

#[test]
fn test_operator_mismatch() {
    let err = compile_err("'a' - 1", &Options::new());
    assert_eq!(err.code, ErrorCode::TYPE_MISMATCH);
    assert_eq!(err.message, "invalid operation: - (mismatched types string and int)");
}

// ══════════════════════════════════════════════════════════════════════════════
// Host functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_host_function_signature() {
    let desc = Descriptor::new().with_func(
        "greet",
        Signature::new(vec![Kind::String], Kind::String),
    );
    let options = Options::new().descriptor(desc);

    assert_eq!(compile_ok("greet('bob')", &options).kind(), &Kind::String);

    let err = compile_err("greet()", &options);
    assert_eq!(err.message, "not enough arguments to call greet");
    let err = compile_err("greet('a', 'b')", &options);
    assert_eq!(err.message, "too many arguments to call greet");
    let err = compile_err("greet(1)", &options);
    assert_eq!(err.code, ErrorCode::TYPE_MISMATCH);
}

#[test]
fn test_calling_a_non_function() {
    let err = compile_err("num()", &Options::new().env(&sample_env()));
    assert_eq!(err.code, ErrorCode::NOT_CALLABLE);
}

#[test]
fn test_env_with_function_value() {
    let upper = quill_stdlib::Function::new(
        "shout",
        Signature::new(vec![Kind::String], Kind::String),
        |args: &[Value]| Ok(Value::from(format!("{}!", args[0]))),
    );
    let env = Env::new().with("shout", upper);
    assert_eq!(
        compile_ok("shout('hi')", &Options::new().env(&env)).kind(),
        &Kind::String
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_as_kind() {
    let options = Options::new().env(&sample_env()).as_kind(Kind::Bool);
    assert_eq!(compile_ok("num > 1", &options).kind(), &Kind::Bool);

    let err = compile_err("num + 1", &options);
    assert_eq!(err.code, ErrorCode::UNEXPECTED_RESULT_KIND);
    assert_eq!(err.message, "expected bool, but got int");

    // `any` is accepted and checked at run time.
    let options = Options::new().as_kind(Kind::Bool);
    assert!(compile("anything", &options).is_ok());
}

#[test]
fn test_pipes_require_option() {
    let err = compile_err("-1 | abs()", &Options::new());
    assert_eq!(err.code, ErrorCode::PIPES_DISABLED);

    let program = compile_ok("-1 | abs()", &Options::new().experimental_pipes());
    assert_eq!(program.kind(), &Kind::Int);
}

#[test]
fn test_max_depth() {
    let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    let err = compile_err(&source, &Options::new().max_depth(10));
    assert_eq!(err.code, ErrorCode::NESTING_TOO_DEEP);
    assert!(compile(&source, &Options::new()).is_ok());
}

#[test]
fn test_all_errors_are_collected() {
    let errors = match compile_all("len() + abs('x') + missing", &Options::new().env(&sample_env())) {
        Ok(_) => panic!("expected errors"),
        Err(errors) => errors,
    };
    assert_eq!(errors.total_errors, 3);
    assert_eq!(errors.errors[0].code, ErrorCode::WRONG_ARG_COUNT);
}

#[test]
fn test_file_name_in_diagnostics() {
    let err = compile_err("len()", &Options::new().file_name("rule.quill"));
    assert_eq!(err.file, "rule.quill");
    assert_eq!(err.source_line, "len()");
}

// ══════════════════════════════════════════════════════════════════════════════
// Fingerprints
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_fingerprint_determinism() {
    let options = Options::new().env(&sample_env());
    let first = compile_ok("num + 1", &options);
    for _ in 0..10 {
        let again = compile_ok("num + 1", &options);
        assert_eq!(again.fingerprint(), first.fingerprint());
        assert_eq!(again, first);
    }
    let other = compile_ok("num + 2", &options);
    assert_ne!(other.fingerprint(), first.fingerprint());
}
