//! Duration-typed string fields.
//!
//! Durations are a run of number and unit pairs with no separators
//! (`100ms`, `1.5s`, `3m`, `120h`, `1h30m`). Units are `ns`, `us` (or
//! `µs`), `ms`, `s`, `m` and `h`. The empty string means "unset" and the
//! bare literal `0` is a zero duration. Signs, spaces and calendar units
//! (`2 days`, `1w`, `1month`) are rejected.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{text}': {reason}")]
pub struct DurationError {
    pub text: String,
    pub reason: String,
}

/// Parse a duration field. `Ok(None)` when the field is unset.
pub fn parse(text: &str) -> Result<Option<Duration>, DurationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed == "0" {
        return Ok(Some(Duration::ZERO));
    }
    let fail = |reason: String| DurationError {
        text: text.to_string(),
        reason,
    };
    let normalized = normalize(trimmed).map_err(fail)?;
    humantime::parse_duration(&normalized)
        .map(Some)
        .map_err(|e| fail(e.to_string()))
}

/// Check the unit-suffix grammar and rewrite it into the spelling
/// humantime expects (`µs` becomes `us`, `.5s` becomes `0.5s`).
fn normalize(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len() + 1);
    let mut rest = text;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);
        if number.matches('.').count() > 1 || !number.contains(|c: char| c.is_ascii_digit()) {
            return Err(format!("expected a number at '{}'", rest));
        }

        let split = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(split);
        let unit = match unit {
            "ns" | "us" | "ms" | "s" | "m" | "h" => unit,
            "µs" | "μs" => "us",
            "" => return Err(format!("missing unit after '{}'", number)),
            other => return Err(format!("unknown unit '{}'", other)),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        out.push_str(if whole.is_empty() { "0" } else { whole });
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        out.push_str(unit);
        rest = tail;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_forms() {
        assert_eq!(parse("100ms").unwrap(), Some(Duration::from_millis(100)));
        assert_eq!(parse("1s").unwrap(), Some(Duration::from_secs(1)));
        assert_eq!(parse("3m").unwrap(), Some(Duration::from_secs(180)));
        assert_eq!(parse("120h").unwrap(), Some(Duration::from_secs(120 * 3600)));
        assert_eq!(parse("1h30m").unwrap(), Some(Duration::from_secs(5400)));
    }

    #[test]
    fn test_parse_unset_and_zero() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("0").unwrap(), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse("abc").unwrap_err();
        assert_eq!(err.text, "abc");
        assert!(err.to_string().starts_with("invalid duration 'abc'"));

        assert!(parse("10").is_err());
        assert!(parse("-1s").is_err());
    }

    #[test]
    fn test_parse_fractions_and_micro_units() {
        assert_eq!(parse("1.5s").unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(parse(".5s").unwrap(), Some(Duration::from_millis(500)));
        assert_eq!(parse("250us").unwrap(), Some(Duration::from_micros(250)));
        assert_eq!(parse("250µs").unwrap(), Some(Duration::from_micros(250)));
        assert_eq!(parse("10ns").unwrap(), Some(Duration::from_nanos(10)));
    }

    #[test]
    fn test_parse_rejects_calendar_and_spaced_forms() {
        for text in ["2 days", "1w", "1month", "1h 30m", "1d", "1.2.3s", "s", "+1s"] {
            let err = parse(text).unwrap_err();
            assert_eq!(err.text, text);
        }
    }
}
