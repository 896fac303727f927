//! Duration/Timestamp arithmetic, parsing, and date-part extraction
//! (spec §4.E). Uses protobuf canonical ranges and CEL's Sunday=0 week
//! numbering. Canonical string forms are specified in SPEC_FULL.md §2:
//! RFC 3339 for timestamps, Go's duration-suffix grammar for durations.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};

use crate::{
    error::{EvalError, EvalResult},
    value::{Duration, Timestamp},
};

/// protobuf canonical range: `[-315,576,000,000, +315,576,000,000]` seconds,
/// nanos in `[-999_999_999, 999_999_999]`, same sign as seconds (or zero).
const MAX_DURATION_SECONDS: i64 = 315_576_000_000;
const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800; // 0001-01-01T00:00:00Z
const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799; // 9999-12-31T23:59:59Z

fn normalize(mut seconds: i64, mut nanos: i64) -> (i64, i64) {
    seconds += nanos.div_euclid(1_000_000_000);
    nanos = nanos.rem_euclid(1_000_000_000);
    (seconds, nanos)
}

pub fn add_duration(a: Duration, b: Duration) -> EvalResult<Duration> {
    let seconds = a.seconds.checked_add(b.seconds).ok_or_else(|| EvalError::numeric_overflow("duration overflow"))?;
    let (seconds, nanos) = normalize(seconds, i64::from(a.nanos) + i64::from(b.nanos));
    check_duration_range(seconds, nanos as i32)
}

pub fn sub_duration(a: Duration, b: Duration) -> EvalResult<Duration> {
    add_duration(a, negate_duration(b)?)
}

pub fn negate_duration(d: Duration) -> EvalResult<Duration> {
    let seconds = d.seconds.checked_neg().ok_or_else(|| EvalError::numeric_overflow("duration overflow"))?;
    check_duration_range(seconds, -d.nanos)
}

fn check_duration_range(seconds: i64, nanos: i32) -> EvalResult<Duration> {
    if seconds.unsigned_abs() > MAX_DURATION_SECONDS as u64 {
        return Err(EvalError::numeric_overflow("duration out of protobuf canonical range"));
    }
    Ok(Duration { seconds, nanos })
}

fn check_timestamp_range(seconds: i64, nanos: i32) -> EvalResult<Timestamp> {
    if !(MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&seconds) {
        return Err(EvalError::numeric_overflow("timestamp out of protobuf canonical range"));
    }
    Ok(Timestamp { seconds, nanos })
}

pub fn add_timestamp_duration(ts: Timestamp, d: Duration) -> EvalResult<Timestamp> {
    let seconds =
        ts.seconds.checked_add(d.seconds).ok_or_else(|| EvalError::numeric_overflow("timestamp overflow"))?;
    let (seconds, nanos) = normalize(seconds, i64::from(ts.nanos) + i64::from(d.nanos));
    check_timestamp_range(seconds, nanos as i32)
}

pub fn sub_timestamp_duration(ts: Timestamp, d: Duration) -> EvalResult<Timestamp> {
    add_timestamp_duration(ts, negate_duration(d)?)
}

pub fn sub_timestamp_timestamp(a: Timestamp, b: Timestamp) -> EvalResult<Duration> {
    let seconds = a.seconds.checked_sub(b.seconds).ok_or_else(|| EvalError::numeric_overflow("duration overflow"))?;
    let (seconds, nanos) = normalize(seconds, i64::from(a.nanos) - i64::from(b.nanos));
    check_duration_range(seconds, nanos as i32)
}

/// Parses the Go-style duration suffix grammar CEL's `duration()` function
/// accepts, e.g. `"72h3m0.5s"`, `"-1.5h"`, `"500ms"`.
pub fn parse_duration(text: &str) -> EvalResult<Duration> {
    let mut rest = text.trim();
    if rest.is_empty() {
        return Err(EvalError::bad_format("empty duration string"));
    }
    let negative = if let Some(stripped) = rest.strip_prefix('-') {
        rest = stripped;
        true
    } else {
        false
    };
    if rest == "0" {
        return Ok(Duration { seconds: 0, nanos: 0 });
    }

    let mut total_seconds: i64 = 0;
    let mut total_nanos: i64 = 0;
    let mut chars = rest.char_indices().peekable();
    let mut any_unit = false;
    while let Some(&(start, c)) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            return Err(EvalError::bad_format(format!("invalid duration string: {text}")));
        }
        let mut end = start;
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                end = idx + c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let number_str = &rest[start..end];
        let number: f64 =
            number_str.parse().map_err(|_| EvalError::bad_format(format!("invalid duration number: {number_str}")))?;

        let unit_start = end;
        let mut unit_end = end;
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                break;
            }
            unit_end = idx + c.len_utf8();
            chars.next();
        }
        let unit = &rest[unit_start..unit_end];
        let seconds_per_unit: f64 = match unit {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "\u{b5}s" => 1e-6,
            "ns" => 1e-9,
            "" => return Err(EvalError::bad_format(format!("missing duration unit in: {text}"))),
            other => return Err(EvalError::bad_format(format!("unknown duration unit: {other}"))),
        };
        let seconds_value = number * seconds_per_unit;
        total_seconds += seconds_value.trunc() as i64;
        total_nanos += (seconds_value.fract() * 1e9).round() as i64;
        any_unit = true;
    }
    if !any_unit {
        return Err(EvalError::bad_format(format!("invalid duration string: {text}")));
    }

    let (mut seconds, mut nanos) = normalize(total_seconds, total_nanos);
    if negative {
        seconds = -seconds;
        nanos = -nanos;
    }
    check_duration_range(seconds, nanos as i32)
}

pub fn format_duration(d: Duration) -> String {
    let total_nanos = i128::from(d.seconds) * 1_000_000_000 + i128::from(d.nanos);
    let sign = if total_nanos < 0 { "-" } else { "" };
    let total_nanos = total_nanos.unsigned_abs();
    let whole_seconds = total_nanos / 1_000_000_000;
    let frac_nanos = total_nanos % 1_000_000_000;
    if frac_nanos == 0 {
        format!("{sign}{whole_seconds}s")
    } else {
        let frac_str = format!("{frac_nanos:09}");
        let frac_trimmed = frac_str.trim_end_matches('0');
        format!("{sign}{whole_seconds}.{frac_trimmed}s")
    }
}

/// Parses an RFC 3339 timestamp, e.g. `"2024-02-29T00:00:00Z"`.
pub fn parse_timestamp(text: &str) -> EvalResult<Timestamp> {
    let dt = DateTime::parse_from_rfc3339(text).map_err(|e| EvalError::bad_format(format!("invalid timestamp: {e}")))?;
    let dt = dt.with_timezone(&Utc);
    check_timestamp_range(dt.timestamp(), dt.timestamp_subsec_nanos() as i32)
}

pub fn format_timestamp(t: Timestamp) -> String {
    let dt = Utc.timestamp_opt(t.seconds, t.nanos as u32).single().expect("timestamp in canonical range");
    if t.nanos == 0 { dt.format("%Y-%m-%dT%H:%M:%SZ").to_string() } else { dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true) }
}

/// A resolved timezone: a fixed `±HH:MM` offset or an IANA zone name.
enum ResolvedTz {
    Fixed(FixedOffset),
    Named(chrono_tz::Tz),
}

fn resolve_timezone(tz: Option<&str>) -> EvalResult<ResolvedTz> {
    let Some(tz) = tz else {
        return Ok(ResolvedTz::Fixed(FixedOffset::east_opt(0).unwrap()));
    };
    if let Some(offset) = parse_fixed_offset(tz) {
        return Ok(ResolvedTz::Fixed(offset));
    }
    tz.parse::<chrono_tz::Tz>().map(ResolvedTz::Named).map_err(|_| EvalError::bad_format(format!("unknown timezone: {tz}")))
}

fn parse_fixed_offset(tz: &str) -> Option<FixedOffset> {
    let (sign, rest) = match tz.strip_prefix('+') {
        Some(rest) => (1, rest),
        None => (-1, tz.strip_prefix('-')?),
    };
    let (h, m) = rest.split_once(':')?;
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn localize(ts: Timestamp, tz: Option<&str>) -> EvalResult<DateTime<FixedOffset>> {
    let utc = Utc.timestamp_opt(ts.seconds, ts.nanos as u32).single().ok_or_else(|| EvalError::bad_format("invalid timestamp"))?;
    match resolve_timezone(tz)? {
        ResolvedTz::Fixed(offset) => Ok(utc.with_timezone(&offset)),
        ResolvedTz::Named(named) => {
            let localized = utc.with_timezone(&named);
            Ok(localized.fixed_offset())
        }
    }
}

/// CEL week numbering: Sunday = 0.
pub fn get_day_of_week(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    let dt = localize(ts, tz)?;
    Ok(i64::from(dt.weekday().num_days_from_sunday()))
}

pub fn get_day_of_month(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.day0()))
}

pub fn get_day_of_year(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.ordinal0()))
}

pub fn get_month(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.month0()))
}

pub fn get_full_year(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.year()))
}

pub fn get_hours(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.hour()))
}

pub fn get_minutes(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.minute()))
}

pub fn get_seconds(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.second()))
}

pub fn get_milliseconds(ts: Timestamp, tz: Option<&str>) -> EvalResult<i64> {
    Ok(i64::from(localize(ts, tz)?.nanosecond() / 1_000_000))
}

/// Duration's own hour/minute/second/millisecond getters: a plain
/// decomposition of the (seconds, nanos) pair, no timezone involved.
pub fn duration_hours(d: Duration) -> i64 {
    d.seconds / 3600
}

pub fn duration_minutes(d: Duration) -> i64 {
    d.seconds / 60
}

pub fn duration_seconds(d: Duration) -> i64 {
    d.seconds
}

pub fn duration_milliseconds(d: Duration) -> i64 {
    d.seconds * 1000 + i64::from(d.nanos) / 1_000_000
}
