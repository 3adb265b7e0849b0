//! Duration parsing with calendar units
//!
//! Accepts the usual elapsed-time grammar (`90s`, `1h30m`, `1.5h`, `250ms`)
//! and falls back to calendar-style tokens that the usual grammar lacks:
//! `d` (24h), `w` (7d), `mo` (30d) and `y` (365d). Calendar tokens may be
//! repeated and combined in any order; they are summed.
use crate::error::{ExportError, Result};
use chrono::TimeDelta;
use regex::Regex;
use std::sync::LazyLock;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

static CALENDAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, always valid
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(\d+)(mo|d|w|y)").unwrap()
});

/// Parse a duration string
///
/// # Errors
///
/// Returns `ExportError::Parse` naming the input when neither grammar
/// accepts it, or when the result does not fit in a duration.
///
/// # Examples
///
/// ```
/// use cloudaudit::duration::parse_duration;
/// use chrono::TimeDelta;
///
/// assert_eq!(parse_duration("90m").unwrap(), TimeDelta::minutes(90));
/// assert_eq!(parse_duration("1mo5d").unwrap(), TimeDelta::days(35));
/// assert!(parse_duration("abc").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let trimmed = input.trim();

    if let Some(duration) = parse_elapsed(trimmed) {
        return Ok(duration);
    }

    parse_calendar(trimmed).ok_or_else(|| {
        ExportError::Parse(format!(
            "Invalid duration: '{input}'. Expected e.g. 30m, 12h, 7d, 2w, 1mo, 1y or combinations like 1mo5d"
        ))
    })
}

/// Sum of repeated `<integer><d|w|mo|y>` tokens; None on any leftover text
fn parse_calendar(s: &str) -> Option<TimeDelta> {
    let mut total_seconds: i64 = 0;
    let mut matched: usize = 0;

    for captures in CALENDAR_TOKEN.captures_iter(s) {
        let count: i64 = captures.get(1)?.as_str().parse().ok()?;
        let unit_seconds = match captures.get(2)?.as_str() {
            "d" => SECONDS_PER_DAY,
            "w" => 7 * SECONDS_PER_DAY,
            "mo" => 30 * SECONDS_PER_DAY,
            "y" => 365 * SECONDS_PER_DAY,
            _ => return None,
        };
        total_seconds = total_seconds.checked_add(count.checked_mul(unit_seconds)?)?;
        matched = matched.saturating_add(1);
    }

    if matched == 0 || !CALENDAR_TOKEN.replace_all(s, "").is_empty() {
        return None;
    }

    TimeDelta::try_seconds(total_seconds)
}

/// Elapsed-time grammar: `[+-]` then one or more `<decimal><unit>` with
/// unit in ns, us, µs, ms, s, m, h. A bare `0` is accepted.
fn parse_elapsed(s: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let scale: i128 = match unit {
            "ns" => 1,
            "us" | "\u{00b5}s" | "\u{03bc}s" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 60 * 60 * 1_000_000_000,
            _ => return None,
        };

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total_nanos = total_nanos.checked_add(whole.checked_mul(scale)?)?;

        // Cap fraction digits so the scaled value stays in range
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: i128 = frac_digits.parse().ok()?;
            let denominator = 10_i128.checked_pow(u32::try_from(frac_digits.len()).ok()?)?;
            total_nanos = total_nanos.checked_add(numerator.checked_mul(scale)? / denominator)?;
        }
    }

    if negative {
        total_nanos = -total_nanos;
    }

    Some(TimeDelta::nanoseconds(i64::try_from(total_nanos).ok()?))
}
