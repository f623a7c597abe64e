//! Built-in functions end to end: compile against an environment, run,
//! and compare results.

use chrono::{TimeDelta, TimeZone, Utc};
use quill::{compile, eval, run, Env, Error, Options, Value};

fn sample_env() -> Env {
    Env::new()
        .with("ArrayOfString", vec!["foo", "bar", "baz"])
        .with("ArrayOfInt", vec![1, 2, 3])
        .with(
            "ArrayOfAny",
            vec![Value::Int(1), Value::from("2"), Value::Bool(true)],
        )
}

fn strings(items: &[&str]) -> Value {
    Value::from(items.to_vec())
}

#[test]
fn test_builtin() {
    let env = sample_env();
    let utc = |y, m, d, h, min, s| {
        Value::from(
            Utc.with_ymd_and_hms(y, m, d, h, min, s)
                .single()
                .expect("valid time"),
        )
    };

    let cases: Vec<(&str, Value)> = vec![
        ("len(1..10)", Value::Int(10)),
        ("len({foo: 1, bar: 2})", Value::Int(2)),
        ("len(\"hello\")", Value::Int(5)),
        ("abs(-5)", Value::Int(5)),
        ("abs(.5)", Value::Float(0.5)),
        ("abs(-.5)", Value::Float(0.5)),
        ("int(5.5)", Value::Int(5)),
        ("int(5)", Value::Int(5)),
        ("int(\"5\")", Value::Int(5)),
        ("float(5)", Value::Float(5.0)),
        ("float(5.5)", Value::Float(5.5)),
        ("float(\"5.5\")", Value::Float(5.5)),
        ("string(5)", Value::from("5")),
        ("string(5.5)", Value::from("5.5")),
        ("string(\"5.5\")", Value::from("5.5")),
        ("trim(\"  foo  \")", Value::from("foo")),
        ("trim(\"__foo___\", \"_\")", Value::from("foo")),
        ("trimPrefix(\"prefix_foo\", \"prefix_\")", Value::from("foo")),
        ("trimSuffix(\"foo_suffix\", \"_suffix\")", Value::from("foo")),
        ("upper(\"foo\")", Value::from("FOO")),
        ("lower(\"FOO\")", Value::from("foo")),
        ("split(\"foo,bar,baz\", \",\")", strings(&["foo", "bar", "baz"])),
        ("splitN(\"foo,bar,baz\", \",\", 2)", strings(&["foo", "bar,baz"])),
        ("splitAfter(\"foo,bar,baz\", \",\")", strings(&["foo,", "bar,", "baz"])),
        ("splitAfterN(\"foo,bar,baz\", \",\", 2)", strings(&["foo,", "bar,baz"])),
        ("replace(\"foo,bar,baz\", \",\", \";\")", Value::from("foo;bar;baz")),
        ("replace(\"foo,bar,baz,goo\", \",\", \";\", 2)", Value::from("foo;bar;baz,goo")),
        ("repeat(\"foo\", 3)", Value::from("foofoofoo")),
        ("join(ArrayOfString, \",\")", Value::from("foo,bar,baz")),
        ("join(ArrayOfString)", Value::from("foobarbaz")),
        ("join([\"foo\", \"bar\", \"baz\"], \",\")", Value::from("foo,bar,baz")),
        ("join([\"foo\", \"bar\", \"baz\"])", Value::from("foobarbaz")),
        ("indexOf(\"foo,bar,baz\", \",\")", Value::Int(3)),
        ("lastIndexOf(\"foo,bar,baz\", \",\")", Value::Int(7)),
        ("hasPrefix(\"foo,bar,baz\", \"foo\")", Value::Bool(true)),
        ("hasSuffix(\"foo,bar,baz\", \"baz\")", Value::Bool(true)),
        ("max(1, 2, 3)", Value::Int(3)),
        ("max(1.5, 2.5, 3.5)", Value::Float(3.5)),
        ("min(1, 2, 3)", Value::Int(1)),
        ("min(1.5, 2.5, 3.5)", Value::Float(1.5)),
        ("toJSON({foo: 1, bar: 2})", Value::from("{\n  \"bar\": 2,\n  \"foo\": 1\n}")),
        ("fromJSON(\"[1, 2, 3]\")", Value::from(vec![1.0, 2.0, 3.0])),
        ("toBase64(\"hello\")", Value::from("aGVsbG8=")),
        ("fromBase64(\"aGVsbG8=\")", Value::from("hello")),
        ("duration(\"1h\")", Value::Duration(TimeDelta::hours(1))),
        ("date(\"2006-01-02T15:04:05Z\")", utc(2006, 1, 2, 15, 4, 5)),
        ("date(\"2006.01.02\", \"2006.01.02\")", utc(2006, 1, 2, 0, 0, 0)),
        ("first(ArrayOfString)", Value::from("foo")),
        ("first(ArrayOfInt)", Value::Int(1)),
        ("first(ArrayOfAny)", Value::Int(1)),
        ("first([])", Value::Nil),
        ("last(ArrayOfString)", Value::from("baz")),
        ("last(ArrayOfInt)", Value::Int(3)),
        ("last(ArrayOfAny)", Value::Bool(true)),
        ("last([])", Value::Nil),
        ("get(ArrayOfString, 1)", Value::from("bar")),
        ("get(ArrayOfString, 99)", Value::Nil),
        ("get(ArrayOfInt, 1)", Value::Int(2)),
        ("get(ArrayOfInt, -1)", Value::Int(3)),
        ("get(ArrayOfAny, 1)", Value::from("2")),
        ("get({foo: 1, bar: 2}, \"foo\")", Value::Int(1)),
        ("get({foo: 1, bar: 2}, \"unknown\")", Value::Nil),
    ];

    for (source, want) in cases {
        let program = match compile(source, Options::new().env(&env)) {
            Ok(program) => program,
            Err(err) => panic!("{source}: {err}"),
        };
        assert_eq!(run(&program, &env), Ok(want), "{source}");
    }
}

#[test]
fn test_now_formats_current_time() {
    let before = Utc::now().format("%Y").to_string();
    let out = eval("now().Format(\"2006\")", &Env::new()).expect("now");
    let after = Utc::now().format("%Y").to_string();
    let year = out.as_str().expect("string").to_string();
    assert!(year == before || year == after, "{year}");
}

#[test]
fn test_builtin_errors() {
    let cases = [
        ("len()", "invalid number of arguments (expected 1, got 0)"),
        ("len(1)", "invalid argument for len (type int)"),
        ("abs()", "invalid number of arguments (expected 1, got 0)"),
        ("abs(1, 2)", "invalid number of arguments (expected 1, got 2)"),
        ("abs(\"foo\")", "invalid argument for abs (type string)"),
        ("int()", "invalid number of arguments (expected 1, got 0)"),
        ("int(1, 2)", "invalid number of arguments (expected 1, got 2)"),
        ("float()", "invalid number of arguments (expected 1, got 0)"),
        ("float(1, 2)", "invalid number of arguments (expected 1, got 2)"),
        ("string(1, 2)", "too many arguments to call string"),
        ("trim()", "not enough arguments to call trim"),
        ("max()", "not enough arguments to call max"),
        ("max(1, \"2\")", "invalid argument for max (type string)"),
        ("min()", "not enough arguments to call min"),
        ("min(1, \"2\")", "invalid argument for min (type string)"),
        ("duration(\"error\")", "invalid duration"),
        ("date(\"error\")", "invalid date"),
        ("get()", "invalid number of arguments (expected 2, got 0)"),
        ("get(1, 2)", "type int does not support indexing"),
    ];
    for (source, want) in cases {
        let err = eval(source, &Env::new()).expect_err(source);
        assert!(
            err.to_string().contains(want),
            "{source}: {err} does not contain {want}"
        );
    }
}

#[test]
fn test_error_variants() {
    let err = eval("len(1)", &Env::new()).expect_err("check error");
    assert!(matches!(err, Error::Compile(_)));
    assert!(err.diagnostic().is_some());

    let err = eval("duration(\"error\")", &Env::new()).expect_err("runtime error");
    assert!(matches!(err, Error::Runtime(_)));
    assert!(err.diagnostic().is_none());
}

#[test]
fn test_split_without_limit() {
    let cases = [
        ("splitN(\"a,b,c\", \",\", 0)", strings(&["a", "b", "c"])),
        ("splitN(\"a,b,c\", \",\", -1)", strings(&["a", "b", "c"])),
        ("splitAfterN(\"a,b,c\", \",\", 0)", strings(&["a,", "b,", "c"])),
        ("splitAfterN(\"a,b,c\", \",\", -3)", strings(&["a,", "b,", "c"])),
    ];
    for (source, want) in cases {
        assert_eq!(eval(source, &Env::new()), Ok(want), "{source}");
    }
}

#[test]
fn test_min_max_large_ints() {
    let cases = [
        ("min(9007199254740993, 9007199254740992)", 9_007_199_254_740_992),
        ("max(9007199254740992, 9007199254740993)", 9_007_199_254_740_993),
    ];
    for (source, want) in cases {
        assert_eq!(eval(source, &Env::new()), Ok(Value::Int(want)), "{source}");
    }
}

#[test]
fn test_repeat_over_budget_is_an_error() {
    let err = eval("repeat(\"x\", 1000000000000)", &Env::new()).expect_err("budget");
    assert!(matches!(err, Error::Runtime(_)));
    assert_eq!(err.to_string(), "memory budget exceeded");
}

#[test]
fn test_json_round_trip() {
    let values = [
        "{b: [1, \"x\"], a: nil}",
        "[1.5, true, 'say \"hi\"', -3]",
        "{outer: {list: [], n: 0.25}, flag: false}",
        "\"text\"",
        "42",
        "nil",
    ];
    for value in values {
        let once = eval(&format!("toJSON({value})"), &Env::new());
        let twice = eval(&format!("toJSON(fromJSON(toJSON({value})))"), &Env::new());
        assert!(once.is_ok(), "{value}: {once:?}");
        assert_eq!(once, twice, "{value}");
    }
}

#[test]
fn test_base64_round_trip() {
    let program = compile(
        "fromBase64(toBase64(s)) == s",
        Options::new().env(&Env::new().with("s", "")),
    )
    .expect("compile");
    for text in ["", "hello", "héllo ✓", "日本語", "emoji 🦀", "line\nbreak\t"] {
        let env = Env::new().with("s", text);
        assert_eq!(run(&program, &env), Ok(Value::Bool(true)), "{text:?}");
    }
}

#[test]
fn test_get_matches_indexing() {
    let sample = Env::new().with("a", vec![10, 20, 30]).with("i", 0);
    let get = compile("get(a, i)", Options::new().env(&sample)).expect("compile get");
    let index = compile("a[i]", Options::new().env(&sample)).expect("compile index");

    for i in -3..3 {
        let env = sample.clone().with("i", i);
        let got = run(&get, &env);
        assert!(matches!(got, Ok(Value::Int(_))), "get(a, {i}): {got:?}");
        assert_eq!(got, run(&index, &env), "i = {i}");
    }
    for i in [-100, -4, 3, 4, 100] {
        let env = sample.clone().with("i", i);
        assert_eq!(run(&get, &env), Ok(Value::Nil), "get(a, {i})");
    }
}
