//! Timestamped lyric lines.

use serde::{Deserialize, Serialize};

/// A single point in a song's timeline with its display text.
///
/// Lines are plain values: an edit replaces the whole line rather than
/// mutating it in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LyricLine {
    /// Offset from the start of the track in milliseconds.
    pub time: u64,
    /// Text shown while this line is active.
    pub text: String,
}

impl LyricLine {
    pub fn new(time: u64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    /// A blank line at the start of the track, as added by the editor.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Copy of this line with a different timestamp.
    #[must_use]
    pub fn with_time(&self, time: u64) -> Self {
        Self {
            time,
            text: self.text.clone(),
        }
    }

    /// Copy of this line with different text.
    #[must_use]
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            time: self.time,
            text: text.into(),
        }
    }

    /// Whether the line carries no visible text (instrumental gap).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Ordered lyric lines. Sorted by time before persistence, but may be
/// unsorted while being edited. Duplicate timestamps are allowed.
pub type LyricSequence = Vec<LyricLine>;

/// Sort lines ascending by time. Lines sharing a timestamp keep their order.
pub fn sort_by_time(lines: &mut [LyricLine]) {
    lines.sort_by_key(|line| line.time);
}

/// Check whether lines are in non-decreasing time order.
pub fn is_sorted_by_time(lines: &[LyricLine]) -> bool {
    lines.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_stable_for_duplicates() {
        let mut lines = vec![
            LyricLine::new(2000, "c"),
            LyricLine::new(1000, "a"),
            LyricLine::new(1000, "b"),
            LyricLine::new(0, ""),
        ];
        assert!(!is_sorted_by_time(&lines));

        sort_by_time(&mut lines);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["", "a", "b", "c"]);
        assert!(is_sorted_by_time(&lines));
    }

    #[test]
    fn test_wire_shape() {
        let line = LyricLine::new(1500, "hello");
        let json = serde_json::to_string(&line).unwrap_or_default();
        assert_eq!(json, r#"{"time":1500,"text":"hello"}"#);
    }

    #[test]
    fn test_with_helpers() {
        let line = LyricLine::new(100, "x");
        assert_eq!(line.with_time(250), LyricLine::new(250, "x"));
        assert_eq!(line.with_text("y"), LyricLine::new(100, "y"));
        assert!(LyricLine::blank().is_blank());
        assert!(LyricLine::new(0, "   ").is_blank());
    }
}
