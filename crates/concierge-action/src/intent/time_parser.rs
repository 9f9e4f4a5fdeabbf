//! Natural language duration parsing for timers.
//!
//! Accepts compound unit expressions ("1h 30m", "2 hours and 5 seconds",
//! "1h30m") in any order and falls back to a heuristic for a bare number:
//! hours when the text carries an `h`, minutes when it carries an `m` or the
//! value exceeds five, seconds otherwise.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TimerError;

static LETTER_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])(\d)").expect("Invalid letter-digit regex"));

static UNIT_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<num>\d+(?:\.\d+)?)\s*(?P<unit>hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)\b",
    )
    .expect("Invalid unit regex")
});

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?P<num>\d+(?:\.\d+)?)\b").expect("Invalid number regex"));

/// Words dropped from the remainder after the duration is taken out.
const CONNECTORS: &[&str] = &["and", "a", "an", "for", "of", "the", "in", ","];

/// A successfully parsed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDuration {
    pub seconds: u64,
    /// Human readable form, e.g. "1 hour 30 minutes".
    pub label: String,
    /// Words that were not part of the duration, usable as a description.
    pub remainder: String,
}

/// Parse a duration expression into whole seconds.
///
/// Fails with [`TimerError::InvalidDuration`] when nothing numeric is found
/// or the total is not positive.
pub fn parse_duration(text: &str) -> Result<ParsedDuration, TimerError> {
    let lowered = text.to_lowercase();
    let spaced = LETTER_DIGIT.replace_all(&lowered, "$1 $2").into_owned();

    let mut total = 0.0_f64;
    let mut matched_any = false;
    let mut remainder = spaced.clone();

    for caps in UNIT_AMOUNT.captures_iter(&spaced) {
        let value: f64 = caps["num"].parse().unwrap_or(0.0);
        let factor = match caps["unit"].chars().next() {
            Some('h') => 3600.0,
            Some('m') => 60.0,
            _ => 1.0,
        };
        total += value * factor;
        matched_any = true;
        remainder = remainder.replacen(&caps[0], " ", 1);
    }

    if !matched_any {
        let caps = BARE_NUMBER
            .captures(&spaced)
            .ok_or_else(|| TimerError::InvalidDuration(text.to_string()))?;
        let value: f64 = caps["num"].parse().unwrap_or(0.0);
        let factor = if lowered.contains('h') {
            3600.0
        } else if lowered.contains('m') || value > 5.0 {
            60.0
        } else {
            1.0
        };
        total = value * factor;
        remainder = remainder.replacen(&caps[0], " ", 1);
    }

    let seconds = total.round();
    if seconds <= 0.0 || !seconds.is_finite() {
        return Err(TimerError::InvalidDuration(text.to_string()));
    }
    let seconds = seconds as u64;

    Ok(ParsedDuration {
        seconds,
        label: format_duration(seconds),
        remainder: clean_remainder(&remainder),
    })
}

/// Render seconds as "1 hour 30 minutes", "45 seconds" and so on.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    for (value, unit) in [(hours, "hour"), (minutes, "minute"), (secs, "second")] {
        match value {
            0 => {}
            1 => parts.push(format!("1 {}", unit)),
            n => parts.push(format!("{} {}s", n, unit)),
        }
    }
    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

fn clean_remainder(text: &str) -> String {
    text.split_whitespace()
        .filter(|w| !CONNECTORS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(text: &str) -> u64 {
        parse_duration(text).unwrap().seconds
    }

    #[test]
    fn test_minutes_word() {
        assert_eq!(secs("10 minutes"), 600);
        assert_eq!(secs("1 minute"), 60);
        assert_eq!(secs("5 mins"), 300);
    }

    #[test]
    fn test_compound_units() {
        assert_eq!(secs("1h 30m"), 5400);
        assert_eq!(secs("1 hour and 30 minutes"), 5400);
        assert_eq!(secs("2 hours 5 seconds"), 7205);
        assert_eq!(secs("30s 1h"), 3630);
    }

    #[test]
    fn test_glued_units() {
        assert_eq!(secs("1h30m"), 5400);
        assert_eq!(secs("1m30s"), 90);
    }

    #[test]
    fn test_fractional_units() {
        assert_eq!(secs("1.5 hours"), 5400);
        assert_eq!(secs("0.5 minutes"), 30);
    }

    #[test]
    fn test_bare_number_above_five_is_minutes() {
        assert_eq!(secs("90"), 5400);
        assert_eq!(secs("6"), 360);
    }

    #[test]
    fn test_bare_number_up_to_five_is_seconds() {
        assert_eq!(secs("3"), 3);
        assert_eq!(secs("5"), 5);
    }

    #[test]
    fn test_bare_number_with_unit_character() {
        // No recognised unit token, but an `h` or `m` appears in the text.
        assert_eq!(secs("2 ish hrs-ish"), 7200);
        assert_eq!(secs("3 more"), 180);
    }

    #[test]
    fn test_zero_is_invalid() {
        let err = parse_duration("0 minutes").unwrap_err();
        assert!(matches!(err, TimerError::InvalidDuration(_)));
        assert!(parse_duration("0").is_err());
    }

    #[test]
    fn test_no_number_is_invalid() {
        assert!(matches!(
            parse_duration("a while"),
            Err(TimerError::InvalidDuration(_))
        ));
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_remainder_keeps_description_words() {
        let parsed = parse_duration("tea 5 minutes").unwrap();
        assert_eq!(parsed.seconds, 300);
        assert_eq!(parsed.remainder, "tea");

        let parsed = parse_duration("1 hour and 30 minutes").unwrap();
        assert_eq!(parsed.remainder, "");
    }

    #[test]
    fn test_labels() {
        assert_eq!(parse_duration("1h 30m").unwrap().label, "1 hour 30 minutes");
        assert_eq!(parse_duration("10 minutes").unwrap().label, "10 minutes");
        assert_eq!(parse_duration("61 seconds").unwrap().label, "1 minute 1 second");
        assert_eq!(format_duration(7322), "2 hours 2 minutes 2 seconds");
        assert_eq!(format_duration(0), "0 seconds");
    }
}
