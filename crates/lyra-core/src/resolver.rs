//! Active-line resolution for synchronized lyrics.
//!
//! The active line at a playback position is the last line whose time is at
//! or before that position. Before the first line, the first line is treated
//! as active ("about to start") so the display is never blank while lyrics
//! exist.

use crate::types::{sort_by_time, LyricLine};

/// Find the index of the line active at `current_ms`.
///
/// `lines` must be sorted ascending by time; the result for unsorted input is
/// unspecified (but never panics). Returns `None` only for an empty slice.
pub fn find_current_index(lines: &[LyricLine], current_ms: i64) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }

    // Negative positions are before every line.
    let Ok(current) = u64::try_from(current_ms) else {
        return Some(0);
    };

    let after = lines.partition_point(|line| line.time <= current);
    Some(after.saturating_sub(1))
}

/// Find the line active at `current_ms`. See [`find_current_index`].
pub fn find_current_line(lines: &[LyricLine], current_ms: i64) -> Option<&LyricLine> {
    find_current_index(lines, current_ms).and_then(|i| lines.get(i))
}

/// A change of the active line reported by [`LineTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// Index of the new active line.
    pub index: usize,
    /// The new active line.
    pub line: LyricLine,
}

/// Follows playback progress and reports when the active line changes.
///
/// Lines are sorted once on construction, so callers may hand over whatever
/// order the document was stored in.
#[derive(Debug, Clone, Default)]
pub struct LineTracker {
    lines: Vec<LyricLine>,
    current: Option<usize>,
}

impl LineTracker {
    pub fn new(mut lines: Vec<LyricLine>) -> Self {
        sort_by_time(&mut lines);
        Self {
            lines,
            current: None,
        }
    }

    /// Replace the tracked lines, e.g. after a track change.
    pub fn reset(&mut self, lines: Vec<LyricLine>) {
        *self = Self::new(lines);
    }

    /// Feed a playback position. Returns the new active line only if it
    /// differs from the one reported by the previous call.
    pub fn update(&mut self, progress_ms: i64) -> Option<LineChange> {
        let index = find_current_index(&self.lines, progress_ms)?;
        if self.current == Some(index) {
            return None;
        }

        self.current = Some(index);
        self.lines.get(index).map(|line| LineChange {
            index,
            line: line.clone(),
        })
    }

    /// Currently active line, as of the last update.
    pub fn current(&self) -> Option<&LyricLine> {
        self.current.and_then(|i| self.lines.get(i))
    }

    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Tracked lines in time order.
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
