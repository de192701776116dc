//! Mission-clock strings (`HH:MM:SS` or `MM:SS`).

/// Parses a clock string into whole seconds.
///
/// Accepts `HH:MM:SS` and `MM:SS`; every part must be non-empty digits.
pub fn parse_clock_seconds(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    if !parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    parts
        .iter()
        .try_fold(0u64, |acc, p| Some(acc.checked_mul(60)? + p.parse::<u64>().ok()?))
}

/// Converts a start-time string to a millisecond seek offset.
pub fn clock_to_millis(text: &str) -> Option<u64> {
    parse_clock_seconds(text).map(|s| s * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_seconds() {
        assert_eq!(parse_clock_seconds("01:05:50"), Some(3950));
        assert_eq!(parse_clock_seconds("1:05:50"), Some(3950));
        assert_eq!(parse_clock_seconds("05:50"), Some(350));
        assert_eq!(parse_clock_seconds(" 00:00:07 "), Some(7));
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert_eq!(parse_clock_seconds(""), None);
        assert_eq!(parse_clock_seconds("50"), None);
        assert_eq!(parse_clock_seconds("01::50"), None);
        assert_eq!(parse_clock_seconds("1:2:3:4"), None);
        assert_eq!(parse_clock_seconds("T+01:05"), None);
    }

    #[test]
    fn test_clock_to_millis() {
        assert_eq!(clock_to_millis("00:01:30"), Some(90_000));
        assert_eq!(clock_to_millis("bad"), None);
    }
}
