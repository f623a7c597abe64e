//! Compile once, run many times.

use std::thread;

use quill::{compile, run, Env, ErrorCode, Kind, Options, Value};

#[test]
fn test_program_reused_across_envs() {
    let sample = Env::new().with("age", 0);
    let program = compile("age >= 18", Options::new().env(&sample).as_kind(Kind::Bool))
        .expect("compile");
    for (age, want) in [(12, false), (18, true), (40, true)] {
        let env = Env::new().with("age", age);
        assert_eq!(run(&program, &env), Ok(Value::Bool(want)), "age {age}");
    }
}

#[test]
fn test_program_shared_across_threads() {
    let sample = Env::new().with("n", 0);
    let program = compile("n * n + 1", Options::new().env(&sample)).expect("compile");

    let results: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8i64)
            .map(|n| {
                let program = &program;
                scope.spawn(move || run(program, &Env::new().with("n", n)))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread").expect("run"))
            .collect()
    });

    let want: Vec<Value> = (0..8i64).map(|n| Value::Int(n * n + 1)).collect();
    assert_eq!(results, want);
}

#[test]
fn test_same_source_same_fingerprint() {
    let a = compile("1 + 2", Options::new()).expect("compile");
    let b = compile("1 + 2", Options::new()).expect("compile");
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_deep_input_is_rejected_not_fatal() {
    for source in [
        format!("1{}", " + 1".repeat(20_000)),
        format!("{}1", "-".repeat(200_000)),
    ] {
        let err = compile(&source, Options::new()).expect_err("too deep");
        let code = err.diagnostic().map(|d| d.code);
        assert_eq!(code, Some(ErrorCode::NESTING_TOO_DEEP));
    }
}
