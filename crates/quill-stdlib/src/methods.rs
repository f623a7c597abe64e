//! Methods on time and duration values.
//!
//! The checker validates `t.Year()` style calls through [`signature_for`];
//! the evaluator dispatches them through [`Value::call_method`]. Host
//! objects answer their own methods.

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Timelike, Utc};
use quill_types::{Kind, Signature};

use crate::error::{StdlibError, StdlibResult};
use crate::layout;
use crate::modules::time::{duration_nanos, format_duration};
use crate::value::Value;

/// Signature of a method on a receiver of kind `kind`, if it exists.
pub fn signature_for(kind: &Kind, name: &str) -> Option<Signature> {
    match kind {
        Kind::Time => time_signature(name),
        Kind::Duration => duration_signature(name),
        _ => None,
    }
}

fn time_signature(name: &str) -> Option<Signature> {
    let sig = match name {
        "Format" => Signature::new(vec![Kind::String], Kind::String),
        "Year" | "Month" | "Day" | "Hour" | "Minute" | "Second" | "Nanosecond" | "YearDay"
        | "Unix" | "UnixMilli" => Signature::new(vec![], Kind::Int),
        "Weekday" | "String" => Signature::new(vec![], Kind::String),
        "UTC" => Signature::new(vec![], Kind::Time),
        "Add" => Signature::new(vec![Kind::Duration], Kind::Time),
        "Sub" => Signature::new(vec![Kind::Time], Kind::Duration),
        "Before" | "After" | "Equal" => Signature::new(vec![Kind::Time], Kind::Bool),
        _ => return None,
    };
    Some(sig)
}

fn duration_signature(name: &str) -> Option<Signature> {
    let sig = match name {
        "Hours" | "Minutes" | "Seconds" => Signature::new(vec![], Kind::Float),
        "Milliseconds" | "Microseconds" | "Nanoseconds" => Signature::new(vec![], Kind::Int),
        "String" => Signature::new(vec![], Kind::String),
        "Abs" => Signature::new(vec![], Kind::Duration),
        _ => return None,
    };
    Some(sig)
}

impl Value {
    /// Invoke `receiver.name(args...)`.
    pub fn call_method(&self, name: &str, args: &[Value]) -> StdlibResult<Value> {
        match self {
            Value::Object(obj) => obj.call_method(name, args),
            Value::Time(t) => {
                check_method_args(self, time_signature(name), name, args)?;
                time_method(t, name, args)
            }
            Value::Duration(d) => {
                check_method_args(self, duration_signature(name), name, args)?;
                duration_method(*d, name)
            }
            _ => Err(unknown_method(self.type_name(), name)),
        }
    }
}

fn unknown_method(type_name: &str, method: &str) -> StdlibError {
    StdlibError::UnknownMethod {
        type_name: type_name.to_string(),
        method: method.to_string(),
    }
}

fn check_method_args(
    receiver: &Value,
    sig: Option<Signature>,
    name: &str,
    args: &[Value],
) -> StdlibResult<()> {
    let sig = sig.ok_or_else(|| unknown_method(receiver.type_name(), name))?;
    if args.len() != sig.params.len() {
        return Err(StdlibError::Arity(format!(
            "invalid number of arguments (expected {}, got {})",
            sig.params.len(),
            args.len()
        )));
    }
    Ok(())
}

fn time_arg<'a>(method: &str, args: &'a [Value]) -> StdlibResult<&'a DateTime<FixedOffset>> {
    match args.first() {
        Some(Value::Time(t)) => Ok(t),
        Some(other) => Err(StdlibError::invalid_argument(method, other.type_name())),
        None => Err(StdlibError::Arity(format!("not enough arguments to call {method}"))),
    }
}

fn time_method(t: &DateTime<FixedOffset>, name: &str, args: &[Value]) -> StdlibResult<Value> {
    let int = |n: i64| -> StdlibResult<Value> { Ok(Value::Int(n)) };
    match name {
        "Format" => {
            let layout = match args.first() {
                Some(Value::String(s)) => s,
                Some(other) => return Err(StdlibError::invalid_argument("Format", other.type_name())),
                None => return Err(StdlibError::Arity("not enough arguments to call Format".into())),
            };
            layout::format(t, layout)
                .map(Value::String)
                .ok_or_else(|| StdlibError::runtime(format!("cannot format time with {layout:?}")))
        }
        "Year" => int(i64::from(t.year())),
        "Month" => int(i64::from(t.month())),
        "Day" => int(i64::from(t.day())),
        "Hour" => int(i64::from(t.hour())),
        "Minute" => int(i64::from(t.minute())),
        "Second" => int(i64::from(t.second())),
        "Nanosecond" => int(i64::from(t.nanosecond())),
        "YearDay" => int(i64::from(t.ordinal())),
        "Unix" => int(t.timestamp()),
        "UnixMilli" => int(t.timestamp_millis()),
        "Weekday" => Ok(Value::String(weekday_name(t).to_string())),
        "String" => Ok(Value::String(t.to_rfc3339())),
        "UTC" => Ok(Value::Time(t.with_timezone(&Utc).fixed_offset())),
        "Add" => match args.first() {
            Some(Value::Duration(d)) => add_duration(t, *d).map(Value::Time),
            Some(other) => Err(StdlibError::invalid_argument("Add", other.type_name())),
            None => Err(StdlibError::Arity("not enough arguments to call Add".into())),
        },
        "Sub" => Ok(Value::Duration(since(t, time_arg("Sub", args)?))),
        "Before" => Ok(Value::Bool(t < time_arg("Before", args)?)),
        "After" => Ok(Value::Bool(t > time_arg("After", args)?)),
        "Equal" => Ok(Value::Bool(t == time_arg("Equal", args)?)),
        _ => Err(unknown_method("time", name)),
    }
}

fn weekday_name(t: &DateTime<FixedOffset>) -> &'static str {
    match t.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

fn duration_method(d: TimeDelta, name: &str) -> StdlibResult<Value> {
    let nanos = duration_nanos(d);
    let clamp = |n: i128| Value::Int(n.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64);
    Ok(match name {
        "Hours" => Value::Float(nanos as f64 / 3.6e12),
        "Minutes" => Value::Float(nanos as f64 / 6e10),
        "Seconds" => Value::Float(nanos as f64 / 1e9),
        "Milliseconds" => clamp(nanos / 1_000_000),
        "Microseconds" => clamp(nanos / 1_000),
        "Nanoseconds" => clamp(nanos),
        "String" => Value::String(format_duration(d)),
        "Abs" => Value::Duration(d.abs()),
        _ => return Err(unknown_method("duration", name)),
    })
}

// ── Time arithmetic ──────────────────────────────────────────────────────────

/// `time + duration`
pub fn add_duration(t: &DateTime<FixedOffset>, d: TimeDelta) -> StdlibResult<DateTime<FixedOffset>> {
    t.checked_add_signed(d)
        .ok_or_else(|| StdlibError::runtime("time out of range"))
}

/// `time - duration`
pub fn sub_duration(t: &DateTime<FixedOffset>, d: TimeDelta) -> StdlibResult<DateTime<FixedOffset>> {
    t.checked_sub_signed(d)
        .ok_or_else(|| StdlibError::runtime("time out of range"))
}

/// `a - b` for two times.
pub fn since(a: &DateTime<FixedOffset>, b: &DateTime<FixedOffset>) -> TimeDelta {
    a.signed_duration_since(*b)
}
