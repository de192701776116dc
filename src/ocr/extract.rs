use regex::Regex;
use std::sync::LazyLock;

use crate::telemetry::Reading;

/// First run of digits, e.g. the km/h readout.
static SPEED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid speed pattern"));

/// First decimal number, e.g. the km altitude readout.
static ALTITUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("valid altitude pattern"));

/// Strips quote characters picked up by the recognizer and surrounding whitespace.
fn strip_quotes(text: &str) -> String {
    text.replace(['"', '\''], "").trim().to_string()
}

/// Extracts the first integer from a recognized speed readout.
///
/// Digit runs that overflow `u32` are recognizer garbage and count as undetected.
pub fn extract_speed(text: &str) -> Reading<u32> {
    let cleaned = strip_quotes(text);
    SPEED_PATTERN
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .into()
}

/// Extracts the first decimal number from a recognized altitude readout.
pub fn extract_altitude(text: &str) -> Reading<f64> {
    let cleaned = strip_quotes(text);
    ALTITUDE_PATTERN
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .into()
}

/// Keeps only digits and colons of a recognized mission clock.
pub fn extract_clock(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == ':')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_speed() {
        assert_eq!(extract_speed("1234 KM/H\n"), Reading::Value(1234));
        assert_eq!(extract_speed("\"  567'\n"), Reading::Value(567));
        assert_eq!(extract_speed("SPEED 12 34"), Reading::Value(12));
        assert_eq!(extract_speed("12.9"), Reading::Value(12));
    }

    #[test]
    fn test_extract_speed_undetected() {
        assert_eq!(extract_speed(""), Reading::Undetected);
        assert_eq!(extract_speed("KM/H"), Reading::Undetected);
        assert_eq!(extract_speed("\u{c}"), Reading::Undetected);
        // Never coerced to zero
        assert_ne!(extract_speed("--"), Reading::Value(0));
    }

    #[test]
    fn test_extract_speed_overflow_is_undetected() {
        assert_eq!(extract_speed("99999999999999"), Reading::Undetected);
    }

    #[test]
    fn test_extract_altitude() {
        assert_eq!(extract_altitude("ALT 12.5 KM"), Reading::Value(12.5));
        assert_eq!(extract_altitude("'65' km"), Reading::Value(65.0));
        assert_eq!(extract_altitude("7."), Reading::Value(7.0));
        assert_eq!(extract_altitude("no digits"), Reading::Undetected);
    }

    #[test]
    fn test_extract_clock() {
        assert_eq!(extract_clock("T+ 01:05:50\n"), "01:05:50");
        assert_eq!(extract_clock("T-00:00:0l"), "00:00:0");
        assert_eq!(extract_clock(""), "");
    }
}
