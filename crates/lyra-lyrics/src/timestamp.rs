//! Timestamp parsing and formatting.

use lyra_core::Error;

/// Parse a clock string like "9.731", "3:53.713" or "1:02:03.5" into
/// milliseconds. A trailing `s` (TTML offset time) is accepted.
pub fn parse_clock(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s.strip_suffix('s').unwrap_or(s);
    if s.is_empty() {
        return None;
    }

    let mut parts = s.rsplitn(3, ':');
    let seconds = parse_seconds(parts.next()?)?;
    let minutes = parts.next().map_or(Some(0), parse_whole)?;
    let hours = parts.next().map_or(Some(0), parse_whole)?;

    // Out-of-range clocks are rejected rather than wrapped.
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_mul(1000)?
        .checked_add(seconds)
}

/// Parse a time typed into the editor.
///
/// Bare integers are milliseconds, matching the stored representation;
/// anything with a `:` or `.` is read as a clock (see [`parse_clock`]).
pub fn parse_timestamp(s: &str) -> lyra_core::Result<u64> {
    let s = s.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse()
            .map_err(|e| Error::Parse(format!("Invalid time '{s}': {e}")));
    }
    parse_clock(s).ok_or_else(|| Error::Parse(format!("Invalid time '{s}'")))
}

/// Format milliseconds as `m:ss.cc`.
pub fn format_timestamp(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{minutes}:{seconds:02}.{centis:02}")
}

fn parse_whole(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Seconds with an optional fraction, in milliseconds.
fn parse_seconds(s: &str) -> Option<u64> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let whole = parse_whole(whole)?;

    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only millisecond precision is kept.
    let mut millis = 0;
    for (i, digit) in frac.bytes().take(3).enumerate() {
        millis += u64::from(digit - b'0') * 10u64.pow(2 - i as u32);
    }

    whole.checked_mul(1000)?.checked_add(millis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("9.731"), Some(9731));
        assert_eq!(parse_clock("3:53.713"), Some(233_713));
        assert_eq!(parse_clock("00:01.5"), Some(1500));
        assert_eq!(parse_clock("01:02.30"), Some(62_300));
        assert_eq!(parse_clock("1:00:00"), Some(3_600_000));
        assert_eq!(parse_clock("12.25s"), Some(12_250));
        assert_eq!(parse_clock("0"), Some(0));
        assert_eq!(parse_clock("1.23456"), Some(1234));
    }

    #[test]
    fn test_parse_clock_rejects_garbage() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("ar:Someone"), None);
        assert_eq!(parse_clock("1:xx"), None);
        assert_eq!(parse_clock("-1.0"), None);
        assert_eq!(parse_clock("Chorus"), None);
    }

    #[test]
    fn test_parse_clock_overflow_is_rejected() {
        assert_eq!(parse_clock("99999999999999999:00.00"), None);
        assert_eq!(parse_clock("18446744073709551615.0"), None);
        assert_eq!(parse_clock("5124095576030431:00:00"), None);
        assert!(parse_timestamp("99999999999999999:00").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1500").unwrap(), 1500);
        assert_eq!(parse_timestamp("1.5").unwrap(), 1500);
        assert_eq!(parse_timestamp("0:01.50").unwrap(), 1500);
        assert!(parse_timestamp("soon").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "0:00.00");
        assert_eq!(format_timestamp(62_345), "1:02.34");
        assert_eq!(format_timestamp(600_000), "10:00.00");
    }
}
