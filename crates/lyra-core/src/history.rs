//! Undo/redo history for the lyric editor.
//!
//! Every mutation snapshots the current lines onto the undo stack and clears
//! the redo stack, so history stays linear: once a new edit is made after an
//! undo, the undone states are gone.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::types::LyricLine;

/// Editable lyric lines with linear undo/redo.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    present: Vec<LyricLine>,
    /// Oldest snapshot at the front.
    past: VecDeque<Vec<LyricLine>>,
    /// Next redo at the back.
    future: Vec<Vec<LyricLine>>,
    /// Lines as last loaded or saved.
    baseline: Option<Vec<LyricLine>>,
    dirty: bool,
    /// Maximum undo depth; `None` keeps everything.
    max_depth: Option<usize>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of undo steps kept. Older snapshots are dropped first.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self.trim_past();
        self
    }

    /// Start editing a freshly loaded document. Clears all history.
    pub fn load(&mut self, lines: Vec<LyricLine>) {
        self.baseline = Some(lines.clone());
        self.present = lines;
        self.past.clear();
        self.future.clear();
        self.dirty = false;
    }

    /// Replace every line as one undoable step.
    pub fn replace_all(&mut self, lines: Vec<LyricLine>) {
        self.record();
        self.present = lines;
    }

    /// Append a single line.
    pub fn insert_one(&mut self, line: LyricLine) {
        self.record();
        self.present.push(line);
    }

    /// Replace the line at `index`.
    pub fn update_at(&mut self, index: usize, line: LyricLine) -> Result<()> {
        self.check_index(index)?;
        self.record();
        self.present[index] = line;
        Ok(())
    }

    /// Delete the line at `index`, returning it.
    pub fn remove_at(&mut self, index: usize) -> Result<LyricLine> {
        self.check_index(index)?;
        self.record();
        Ok(self.present.remove(index))
    }

    /// Move the line at `from` so that it ends up at `to`.
    ///
    /// Moving a line onto itself changes nothing and records no history.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        self.record();
        let line = self.present.remove(from);
        self.present.insert(to, line);
        Ok(())
    }

    /// Append several lines as one undoable step.
    pub fn bulk_append(&mut self, lines: impl IntoIterator<Item = LyricLine>) {
        self.record();
        self.present.extend(lines);
    }

    /// Step back one edit. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        true
    }

    /// Re-apply the last undone edit. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        true
    }

    /// Flag the document as having unsaved edits.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Record the current lines as persisted. History is kept.
    pub fn mark_saved(&mut self) {
        self.baseline = Some(self.present.clone());
        self.dirty = false;
    }

    /// Current lines.
    pub fn present(&self) -> &[LyricLine] {
        &self.present
    }

    pub fn into_present(self) -> Vec<LyricLine> {
        self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Lines as last loaded or saved, if any.
    pub fn baseline(&self) -> Option<&[LyricLine]> {
        self.baseline.as_deref()
    }

    /// Whether the current lines differ from the baseline.
    pub fn differs_from_baseline(&self) -> bool {
        self.baseline
            .as_deref()
            .map_or(!self.present.is_empty(), |base| base != self.present.as_slice())
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.present.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.present.len(),
            })
        }
    }

    /// Snapshot the present before a mutation and invalidate redo.
    fn record(&mut self) {
        let snapshot = self.present.clone();
        self.push_past(snapshot);
        self.future.clear();
    }

    fn push_past(&mut self, snapshot: Vec<LyricLine>) {
        self.past.push_back(snapshot);
        self.trim_past();
    }

    fn trim_past(&mut self) {
        if let Some(max) = self.max_depth {
            while self.past.len() > max {
                self.past.pop_front();
            }
        }
    }
}
