//! Time built-ins: `now`, `duration`, `date`, plus duration text handling.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use quill_types::Kind;

use crate::error::{StdlibError, StdlibResult};
use crate::layout;
use crate::registry::{expect_all, string_arg, ArgError, ArgInfo, Arity, Builtin, StdlibModule};
use crate::value::Value;

pub struct TimeModule;

impl StdlibModule for TimeModule {
    fn name(&self) -> &'static str {
        "time"
    }

    fn builtins(&self) -> Vec<Builtin> {
        vec![
            Builtin::new(
                "now",
                "time",
                Arity::Exact(0),
                "Current wall-clock time in UTC.",
                |_| Ok(Kind::Time),
                |_| Ok(Value::Time(Utc::now().fixed_offset())),
            ),
            Builtin::new(
                "duration",
                "time",
                Arity::Exact(1),
                "Parse a duration such as `1h30m` or `250ms`.",
                |args| strings_to(args, Kind::Duration),
                |args| parse_duration(string_arg("duration", args, 0)?).map(Value::Duration),
            ),
            Builtin::new(
                "date",
                "time",
                Arity::Between(1, 2),
                "Parse a date; the optional second argument is a reference-time layout.",
                |args| strings_to(args, Kind::Time),
                date,
            ),
        ]
    }
}

fn strings_to(args: &[ArgInfo], result: Kind) -> Result<Kind, ArgError> {
    expect_all(args, &Kind::String)?;
    Ok(result)
}

// ══════════════════════════════════════════════════════════════════════════════
// Dates
// ══════════════════════════════════════════════════════════════════════════════

/// Layouts tried, in order, after RFC 3339 and RFC 2822.
const DATE_LAYOUTS: &[&str] = &[
    "2006-01-02 15:04:05",
    "2006-01-02T15:04:05",
    "2006-01-02 15:04",
    "2006-01-02",
    "02 Jan 06 15:04 -0700",
];

fn date(args: &[Value]) -> StdlibResult<Value> {
    let text = string_arg("date", args, 0)?;
    let parsed = match args.get(1) {
        Some(_) => layout::parse(text, string_arg("date", args, 1)?),
        None => parse_date(text),
    };
    parsed.map(Value::Time).ok_or(StdlibError::InvalidDate)
}

/// Parse a date in one of the common formats.
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| layout::parse(text, layout))
        })
}

// ══════════════════════════════════════════════════════════════════════════════
// Durations
// ══════════════════════════════════════════════════════════════════════════════

const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    })
}

/// Parse a signed sequence of decimal numbers with units, e.g. `1h30m`,
/// `-1.5s`, `300ms`. A bare `0` is accepted.
pub fn parse_duration(text: &str) -> StdlibResult<TimeDelta> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(StdlibError::InvalidDuration);
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, tail) = rest.split_at(int_len);
        rest = tail;

        let mut frac_part = "";
        if let Some(tail) = rest.strip_prefix('.') {
            let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
            (frac_part, rest) = tail.split_at(frac_len);
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(StdlibError::InvalidDuration);
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, tail) = rest.split_at(unit_len);
        rest = tail;
        let unit = unit_nanos(unit).ok_or(StdlibError::InvalidDuration)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| StdlibError::InvalidDuration)?
        };
        let mut nanos = whole
            .checked_mul(unit)
            .ok_or(StdlibError::InvalidDuration)?;
        // Digits past 18 cannot change the result by a full nanosecond.
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let frac: u128 = frac_digits.parse().map_err(|_| StdlibError::InvalidDuration)?;
            let scale = 10u128.pow(frac_digits.len() as u32);
            nanos += frac * unit / scale;
        }
        total = total
            .checked_add(nanos)
            .filter(|&t| t <= i64::MAX as u128)
            .ok_or(StdlibError::InvalidDuration)?;
    }

    let nanos = i64::try_from(total).map_err(|_| StdlibError::InvalidDuration)?;
    Ok(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Total nanoseconds in a duration.
pub fn duration_nanos(d: TimeDelta) -> i128 {
    i128::from(d.num_seconds()) * NANOS_PER_SECOND + i128::from(d.subsec_nanos())
}

/// Render a duration as `72h3m0.5s`; spans under a second use the largest
/// fitting unit (`1.5ms`, `20µs`), and zero is `0s`.
pub fn format_duration(d: TimeDelta) -> String {
    let nanos = duration_nanos(d);
    let u = nanos.unsigned_abs();
    let sign = if nanos < 0 { "-" } else { "" };
    if u == 0 {
        return "0s".to_string();
    }
    if u < NANOS_PER_SECOND as u128 {
        let (digits, unit) = match u {
            0..=999 => (0, "ns"),
            1_000..=999_999 => (3, "µs"),
            _ => (6, "ms"),
        };
        let (whole, frac) = split_fraction(u, digits);
        return format!("{sign}{whole}{frac}{unit}");
    }

    let (seconds, frac) = split_fraction(u, 9);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let mut out = sign.to_string();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{seconds}{frac}s"));
    out
}

/// Split `v` into `v / 10^digits` and a `.ddd` fraction with trailing
/// zeros removed (empty when the fraction is zero).
fn split_fraction(v: u128, digits: u32) -> (u128, String) {
    let scale = 10u128.pow(digits);
    let (whole, frac) = (v / scale, v % scale);
    if frac == 0 {
        return (whole, String::new());
    }
    let text = format!("{frac:0width$}", width = digits as usize);
    (whole, format!(".{}", text.trim_end_matches('0')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("1h"), Ok(TimeDelta::hours(1)));
        assert_eq!(parse_duration("1h30m"), Ok(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("-1.5s"), Ok(TimeDelta::milliseconds(-1500)));
        assert_eq!(parse_duration(".5ms"), Ok(TimeDelta::microseconds(500)));
        assert_eq!(parse_duration("3µs"), Ok(TimeDelta::microseconds(3)));
        assert_eq!(parse_duration("0"), Ok(TimeDelta::zero()));
    }

    #[test]
    fn test_parse_duration_errors() {
        for bad in ["", "error", "1", "1x", ".s", "-", "9999999999h"] {
            assert_eq!(parse_duration(bad), Err(StdlibError::InvalidDuration), "{bad:?}");
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::hours(1)), "1h0m0s");
        assert_eq!(format_duration(TimeDelta::milliseconds(1500)), "1.5s");
        assert_eq!(format_duration(TimeDelta::milliseconds(100)), "100ms");
        assert_eq!(format_duration(TimeDelta::microseconds(1500)), "1.5ms");
        assert_eq!(format_duration(TimeDelta::nanoseconds(20)), "20ns");
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::minutes(-2)), "-2m0s");
    }

    #[test]
    fn test_parse_date_formats() {
        let t = parse_date("2006-01-02T15:04:05Z").expect("rfc3339");
        assert_eq!(t.to_rfc3339(), "2006-01-02T15:04:05+00:00");
        assert!(parse_date("2006-01-02").is_some());
        assert!(parse_date("2006-01-02 15:04:05").is_some());
        assert!(parse_date("error").is_none());
    }

    #[test]
    fn test_date_builtin_errors() {
        assert_eq!(date(&[Value::from("error")]), Err(StdlibError::InvalidDate));
        assert_eq!(
            date(&[Value::from("2006.01.02"), Value::from("2006-01-02")]),
            Err(StdlibError::InvalidDate)
        );
    }
}
