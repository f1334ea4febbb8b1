//! Lyric text formats for Lyra.
//!
//! Turns pasted or imported lyric text into [`LyricLine`]s for the editor,
//! and writes lines back out as LRC.

mod lrc;
mod parser;
mod timestamp;

use lyra_core::LyricLine;

pub use lrc::{parse_lrc, to_lrc};
pub use parser::parse_ttml;
pub use timestamp::{format_timestamp, parse_clock, parse_timestamp};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsFormat {
    /// `[mm:ss.xx]text` lines.
    Lrc,
    /// Timed-text XML.
    Ttml,
    /// Untimed text, one lyric per row.
    Plain,
}

impl LyricsFormat {
    /// Guess the format of `text`.
    pub fn detect(text: &str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('<') {
            return Self::Ttml;
        }

        let has_time_tag = trimmed.lines().any(|line| {
            line.trim_start()
                .strip_prefix('[')
                .and_then(|rest| rest.split_once(']'))
                .is_some_and(|(tag, _)| parse_clock(tag).is_some())
        });

        if has_time_tag {
            Self::Lrc
        } else {
            Self::Plain
        }
    }

    /// Parse `text` as this format.
    pub fn parse(self, text: &str) -> lyra_core::Result<Vec<LyricLine>> {
        match self {
            Self::Lrc => Ok(parse_lrc(text)),
            Self::Ttml => parse_ttml(text),
            Self::Plain => Ok(parse_plain(text)),
        }
    }
}

/// Split untimed text into lines at time zero, skipping blank rows.
pub fn parse_plain(text: &str) -> Vec<LyricLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| LyricLine::new(0, line))
        .collect()
}

/// Detect the format of `text` and parse it.
pub fn detect_and_parse(text: &str) -> lyra_core::Result<Vec<LyricLine>> {
    LyricsFormat::detect(text).parse(text)
}
