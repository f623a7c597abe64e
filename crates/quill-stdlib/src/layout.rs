//! Reference-time layouts.
//!
//! Layouts describe a format by writing out the reference time
//! `Mon Jan 2 15:04:05 MST 2006` (`01/02 03:04:05PM '06 -0700`). This module
//! translates a layout into chrono format items, which are then used both
//! to format and to parse.

use std::fmt::Write;

use chrono::format::{Fixed, Item, Numeric, Pad, Parsed};
use chrono::{DateTime, FixedOffset};

/// Translate a layout into chrono items. Text that is not a recognized
/// chunk of the reference time is kept literally.
pub fn items(layout: &str) -> Vec<Item<'_>> {
    let bytes = layout.as_bytes();
    let mut items = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match std_chunk(&bytes[i..]) {
            Some((item, width)) => {
                push_literal(&mut items, &layout[literal_start..i]);
                items.push(item);
                i += width;
                literal_start = i;
            }
            None => i += 1,
        }
    }
    push_literal(&mut items, &layout[literal_start..]);
    items
}

/// Whitespace runs become `Space` items so parsing tolerates padding.
fn push_literal<'a>(items: &mut Vec<Item<'a>>, text: &'a str) {
    let mut start = 0;
    let mut in_space = false;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() != in_space {
            if idx > start {
                items.push(literal_item(&text[start..idx], in_space));
            }
            start = idx;
            in_space = c.is_whitespace();
        }
    }
    if start < text.len() {
        items.push(literal_item(&text[start..], in_space));
    }
}

fn literal_item(text: &str, space: bool) -> Item<'_> {
    if space {
        Item::Space(text)
    } else {
        Item::Literal(text)
    }
}

fn num(field: Numeric, pad: Pad) -> Item<'static> {
    Item::Numeric(field, pad)
}

/// Recognize a reference-time chunk at the start of `rest`, returning the
/// item and the number of bytes it spans.
fn std_chunk(rest: &[u8]) -> Option<(Item<'static>, usize)> {
    let at = |i: usize| rest.get(i).copied();
    let chunk = match rest.first()? {
        b'J' if rest.starts_with(b"January") => (Item::Fixed(Fixed::LongMonthName), 7),
        b'J' if rest.starts_with(b"Jan") => (Item::Fixed(Fixed::ShortMonthName), 3),
        b'M' if rest.starts_with(b"Monday") => (Item::Fixed(Fixed::LongWeekdayName), 6),
        b'M' if rest.starts_with(b"Mon") => (Item::Fixed(Fixed::ShortWeekdayName), 3),
        b'M' if rest.starts_with(b"MST") => (Item::Fixed(Fixed::TimezoneName), 3),
        b'0' if rest.starts_with(b"002") => (num(Numeric::Ordinal, Pad::Zero), 3),
        b'0' => {
            let field = match at(1)? {
                b'1' => Numeric::Month,
                b'2' => Numeric::Day,
                b'3' => Numeric::Hour12,
                b'4' => Numeric::Minute,
                b'5' => Numeric::Second,
                b'6' => Numeric::YearMod100,
                _ => return None,
            };
            (num(field, Pad::Zero), 2)
        }
        b'1' if rest.starts_with(b"15") => (num(Numeric::Hour, Pad::Zero), 2),
        b'1' => (num(Numeric::Month, Pad::None), 1),
        b'2' if rest.starts_with(b"2006") => (num(Numeric::Year, Pad::Zero), 4),
        b'2' => (num(Numeric::Day, Pad::None), 1),
        // `_2006` is a literal underscore followed by the year.
        b'_' if rest.starts_with(b"_2006") => return None,
        b'_' if rest.starts_with(b"__2") => (num(Numeric::Ordinal, Pad::Space), 3),
        b'_' if rest.starts_with(b"_2") => (num(Numeric::Day, Pad::Space), 2),
        b'3' => (num(Numeric::Hour12, Pad::None), 1),
        b'4' => (num(Numeric::Minute, Pad::None), 1),
        b'5' => (num(Numeric::Second, Pad::None), 1),
        b'P' if rest.starts_with(b"PM") => (Item::Fixed(Fixed::UpperAmPm), 2),
        b'p' if rest.starts_with(b"pm") => (Item::Fixed(Fixed::LowerAmPm), 2),
        b'-' if rest.starts_with(b"-07:00:00") => {
            (Item::Fixed(Fixed::TimezoneOffsetDoubleColon), 9)
        }
        b'-' if rest.starts_with(b"-0700") => (Item::Fixed(Fixed::TimezoneOffset), 5),
        b'-' if rest.starts_with(b"-07:00") => (Item::Fixed(Fixed::TimezoneOffsetColon), 6),
        b'-' if rest.starts_with(b"-07") => (Item::Fixed(Fixed::TimezoneOffsetTripleColon), 3),
        b'Z' if rest.starts_with(b"Z0700") => (Item::Fixed(Fixed::TimezoneOffsetZ), 5),
        b'Z' if rest.starts_with(b"Z07:00") => (Item::Fixed(Fixed::TimezoneOffsetColonZ), 6),
        b'Z' if rest.starts_with(b"Z07") => (Item::Fixed(Fixed::TimezoneOffsetColonZ), 3),
        b'.' => fraction(rest)?,
        _ => return None,
    };
    Some(chunk)
}

/// `.000` prints a fixed number of digits, `.999` trims trailing zeros. A
/// run followed by another digit is literal text (`.01` in `2006.01.02`).
fn fraction(rest: &[u8]) -> Option<(Item<'static>, usize)> {
    let digit = *rest.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = rest[1..].iter().take_while(|&&b| b == digit).count();
    if rest.get(1 + run).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let fixed = match (digit, run) {
        (b'9', _) => Fixed::Nanosecond,
        (_, 0..=3) => Fixed::Nanosecond3,
        (_, 4..=6) => Fixed::Nanosecond6,
        _ => Fixed::Nanosecond9,
    };
    Some((Item::Fixed(fixed), 1 + run))
}

/// Format `time` with a reference-time layout.
pub fn format(time: &DateTime<FixedOffset>, layout: &str) -> Option<String> {
    let items = items(layout);
    let mut out = String::new();
    write!(out, "{}", time.format_with_items(items.iter())).ok()?;
    Some(out)
}

/// Parse `value` with a reference-time layout.
///
/// Values without an offset are taken as UTC; values without a time of
/// day are taken at midnight.
pub fn parse(value: &str, layout: &str) -> Option<DateTime<FixedOffset>> {
    let items = items(layout);
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, value, items.iter()).ok()?;
    if let Ok(time) = parsed.to_datetime() {
        return Some(time);
    }
    if let Ok(naive) = parsed.to_naive_datetime_with_offset(0) {
        return Some(naive.and_utc().fixed_offset());
    }
    let date = parsed.to_naive_date().ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn reference() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2023, 4, 9, 7, 5, 3)
            .single()
            .expect("valid time")
            .fixed_offset()
    }

    #[test]
    fn test_format_numeric_layouts() {
        let t = reference();
        assert_eq!(format(&t, "2006-01-02T15:04:05Z").as_deref(), Some("2023-04-09T07:05:03Z"));
        assert_eq!(format(&t, "2006.01.02").as_deref(), Some("2023.04.09"));
        assert_eq!(format(&t, "1/2/06 3:4:5 PM").as_deref(), Some("4/9/23 7:5:3 AM"));
    }

    #[test]
    fn test_format_names() {
        let t = reference();
        assert_eq!(format(&t, "Monday, January 2").as_deref(), Some("Sunday, April 9"));
        assert_eq!(format(&t, "Mon Jan _2").as_deref(), Some("Sun Apr  9"));
    }

    #[test]
    fn test_parse_without_offset_is_utc() {
        let t = parse("2006.01.02", "2006.01.02").expect("parsed");
        let expected = NaiveDate::from_ymd_opt(2006, 1, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
            .and_utc()
            .fixed_offset();
        assert_eq!(t, expected);
    }

    #[test]
    fn test_parse_with_offset() {
        let t = parse("2006-01-02 15:04:05 +0100", "2006-01-02 15:04:05 -0700").expect("parsed");
        assert_eq!(t.offset().local_minus_utc(), 3600);
        assert_eq!(t.with_timezone(&Utc).to_rfc3339(), "2006-01-02T14:04:05+00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("error", "2006-01-02").is_none());
    }

    #[test]
    fn test_fraction_chunks() {
        assert!(matches!(fraction(b".000"), Some((Item::Fixed(Fixed::Nanosecond3), 4))));
        assert!(matches!(fraction(b".999999"), Some((Item::Fixed(Fixed::Nanosecond), 7))));
        assert!(fraction(b".01").is_none());
    }
}
