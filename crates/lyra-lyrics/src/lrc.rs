//! LRC (`[mm:ss.xx]text`) reading and writing.

use std::fmt::Write;

use lyra_core::{sort_by_time, LyricLine};
use tracing::debug;

use crate::timestamp::parse_clock;

/// Parse LRC text into lines sorted by time.
///
/// A row may carry several time tags (`[00:10.00][01:10.00]chorus`), each of
/// which yields a line. `[offset:+/-ms]` shifts every line earlier/later.
/// Other metadata tags and untagged rows are skipped.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    let mut offset_ms: i64 = 0;

    for (row_no, row) in text.lines().enumerate() {
        let mut rest = row.trim();
        let mut times = Vec::new();

        while let Some(after_open) = rest.strip_prefix('[') {
            let Some((tag, after_close)) = after_open.split_once(']') else {
                break;
            };

            if let Some(time) = parse_clock(tag) {
                times.push(time);
            } else if let Some((key, value)) = tag.split_once(':') {
                if key.trim().eq_ignore_ascii_case("offset") {
                    offset_ms = value.trim().parse().unwrap_or_else(|_| {
                        debug!("Ignoring malformed offset tag: {tag}");
                        0
                    });
                }
            }
            rest = after_close;
        }

        if times.is_empty() {
            if !rest.trim().is_empty() {
                debug!("Skipping untimed LRC row {}: {}", row_no + 1, rest.trim());
            }
            continue;
        }

        let text = rest.trim();
        lines.extend(times.into_iter().map(|time| LyricLine::new(time, text)));
    }

    if offset_ms != 0 {
        for line in &mut lines {
            let shifted = i128::from(line.time) - i128::from(offset_ms);
            line.time = u64::try_from(shifted.max(0)).unwrap_or(u64::MAX);
        }
    }

    sort_by_time(&mut lines);
    lines
}

/// Write lines as LRC, one `[mm:ss.xx]` tag per line.
pub fn to_lrc(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let minutes = line.time / 60_000;
        let seconds = (line.time % 60_000) / 1000;
        let centis = (line.time % 1000) / 10;
        let _ = writeln!(out, "[{minutes:02}:{seconds:02}.{centis:02}]{}", line.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let lrc = "\
[ti:Song]
[ar:Artist]
[00:01.00]First line
[00:03.50] Second line
[00:05.123]Third";

        let lines = parse_lrc(lrc);
        assert_eq!(
            lines,
            vec![
                LyricLine::new(1000, "First line"),
                LyricLine::new(3500, "Second line"),
                LyricLine::new(5123, "Third"),
            ]
        );
    }

    #[test]
    fn test_repeated_tags_and_sorting() {
        let lines = parse_lrc("[00:10.00][00:02.00]Chorus\n[00:05.00]Verse");
        let texts: Vec<_> = lines.iter().map(|l| (l.time, l.text.as_str())).collect();
        assert_eq!(texts, [(2000, "Chorus"), (5000, "Verse"), (10_000, "Chorus")]);
    }

    #[test]
    fn test_offset_shifts_and_clamps() {
        let lines = parse_lrc("[offset:+500]\n[00:00.20]early\n[00:02.00]later");
        assert_eq!(lines[0].time, 0);
        assert_eq!(lines[1].time, 1500);

        let lines = parse_lrc("[offset:-250]\n[00:01.00]x");
        assert_eq!(lines[0].time, 1250);
    }

    #[test]
    fn test_extreme_offsets_saturate() {
        let lines = parse_lrc("[offset:-9223372036854775808]\n[00:01.00]x");
        assert_eq!(lines[0].time, u64::MAX);

        let lines = parse_lrc("[offset:9223372036854775807]\n[00:01.00]x");
        assert_eq!(lines[0].time, 0);
    }

    #[test]
    fn test_out_of_range_time_tag_is_skipped() {
        let lines = parse_lrc("[99999999999999999:00.00]boom\n[00:01.00]ok");
        assert_eq!(lines, vec![LyricLine::new(1000, "ok")]);
    }

    #[test]
    fn test_empty_text_lines_are_kept() {
        // Instrumental breaks are timed lines with no text.
        let lines = parse_lrc("[00:01.00]a\n[00:04.00]\n[00:06.00]b");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_blank());
    }

    #[test]
    fn test_untagged_and_broken_rows_skipped() {
        let lines = parse_lrc("just text\n[00:01.00 missing close\n[00:02.00]ok");
        assert_eq!(lines, vec![LyricLine::new(2000, "ok")]);
    }

    #[test]
    fn test_to_lrc() {
        let out = to_lrc(&[LyricLine::new(1000, "a"), LyricLine::new(62_340, "b")]);
        assert_eq!(out, "[00:01.00]a\n[01:02.34]b\n");
        assert_eq!(parse_lrc(&out)[1], LyricLine::new(62_340, "b"));
    }
}
