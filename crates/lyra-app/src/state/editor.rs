//! Interactive lyric editing session.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use lyra_core::{find_current_index, is_sorted_by_time, sort_by_time, EditHistory, LyricLine, SongLyrics};
use lyra_lyrics::{detect_and_parse, format_timestamp};
use lyra_store::LyricsStore;
use tracing::{debug, info};

use super::command::{parse_command, EditorCommand, HELP};

/// Line that ends a `paste` block.
const PASTE_END: &str = ".";

/// A document being edited, with undo/redo over its lines.
#[derive(Debug, Clone)]
pub struct EditorSession {
    song: SongLyrics,
    history: EditHistory,
}

/// What the REPL should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print this and keep reading.
    Continue(String),
    /// Read a paste block, then call [`EditorSession::paste`].
    ReadPaste,
    Quit,
}

impl EditorSession {
    /// Start editing `song`. Its current lines become the baseline.
    ///
    /// `history_depth` caps the undo steps kept; `None` keeps them all.
    pub fn new(song: SongLyrics, history_depth: Option<usize>) -> Self {
        let mut history = match history_depth {
            Some(depth) => EditHistory::new().with_max_depth(depth),
            None => EditHistory::new(),
        };
        history.load(song.lyrics.clone());
        Self { song, history }
    }

    pub fn lines(&self) -> &[LyricLine] {
        self.history.present()
    }

    pub const fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    /// Run one command against the session.
    pub fn apply(&mut self, command: EditorCommand, store: &LyricsStore) -> Result<Step> {
        let message = match command {
            EditorCommand::List => self.render(None),
            EditorCommand::Add { time, text } => {
                let line = LyricLine::new(time.unwrap_or(0), text);
                self.history.insert_one(line);
                self.history.mark_dirty();
                format!("added line {}", self.history.len() - 1)
            }
            EditorCommand::Set { index, time, text } => {
                self.history.update_at(index, LyricLine::new(time, text))?;
                self.history.mark_dirty();
                format!("updated line {index}")
            }
            EditorCommand::Time { index, time } => {
                let line = self.line(index)?.with_time(time);
                self.history.update_at(index, line)?;
                self.history.mark_dirty();
                format!("line {index} now at {}", format_timestamp(time))
            }
            EditorCommand::Text { index, text } => {
                let line = self.line(index)?.with_text(text);
                self.history.update_at(index, line)?;
                self.history.mark_dirty();
                format!("reworded line {index}")
            }
            EditorCommand::Remove { index } => {
                let removed = self.history.remove_at(index)?;
                self.history.mark_dirty();
                format!("removed line {index}: {}", removed.text)
            }
            EditorCommand::Move { from, to } => {
                self.history.reorder(from, to)?;
                if from != to {
                    self.history.mark_dirty();
                }
                format!("moved line {from} to {to}")
            }
            EditorCommand::Paste => return Ok(Step::ReadPaste),
            EditorCommand::Sort => self.sort(),
            EditorCommand::At { time } => match find_current_index(self.lines(), time) {
                Some(index) => self.render(Some(index)),
                None => "no lines".to_string(),
            },
            EditorCommand::Undo => {
                if self.history.undo() {
                    self.history.mark_dirty();
                    format!("undone ({})", self.depths())
                } else {
                    "nothing to undo".to_string()
                }
            }
            EditorCommand::Redo => {
                if self.history.redo() {
                    self.history.mark_dirty();
                    format!("redone ({})", self.depths())
                } else {
                    "nothing to redo".to_string()
                }
            }
            EditorCommand::Save => {
                self.save(store)?;
                format!("saved {} lines", self.history.len())
            }
            EditorCommand::Quit { force } => {
                if self.is_dirty() && !force {
                    "unsaved changes; 'save' first or 'quit!' to discard".to_string()
                } else {
                    return Ok(Step::Quit);
                }
            }
            EditorCommand::Help => HELP.to_string(),
        };
        Ok(Step::Continue(message))
    }

    /// Append parsed lyric text as a single undoable step.
    pub fn paste(&mut self, text: &str) -> Result<usize> {
        let lines = detect_and_parse(text).context("Failed to parse pasted lyrics")?;
        let count = lines.len();
        if count > 0 {
            self.history.bulk_append(lines);
            self.history.mark_dirty();
        }
        Ok(count)
    }

    /// Persist the current lines and make them the new baseline.
    ///
    /// The store saves lines in time order; if they are out of order here
    /// they are sorted first (as an undoable step) so the editor shows what
    /// was stored.
    pub fn save(&mut self, store: &LyricsStore) -> Result<()> {
        if !is_sorted_by_time(self.history.present()) {
            self.sort();
        }

        let mut song = self.song.clone();
        song.lyrics = self.history.present().to_vec();
        self.song = store.save(song).context("Failed to save lyrics")?;
        self.history.mark_saved();
        info!("Saved {} ({} lines)", self.song.id, self.song.lyrics.len());
        Ok(())
    }

    fn sort(&mut self) -> String {
        if is_sorted_by_time(self.history.present()) {
            return "already sorted".to_string();
        }
        let mut lines = self.history.present().to_vec();
        sort_by_time(&mut lines);
        self.history.replace_all(lines);
        self.history.mark_dirty();
        "sorted".to_string()
    }

    fn line(&self, index: usize) -> Result<&LyricLine> {
        self.lines().get(index).ok_or_else(|| {
            lyra_core::Error::IndexOutOfRange {
                index,
                len: self.history.len(),
            }
            .into()
        })
    }

    fn depths(&self) -> String {
        format!(
            "{} to undo, {} to redo",
            self.history.undo_depth(),
            self.history.redo_depth()
        )
    }

    /// Numbered listing, with `active` marked.
    pub fn render(&self, active: Option<usize>) -> String {
        if self.lines().is_empty() {
            return "(no lines)".to_string();
        }
        self.lines()
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let marker = if active == Some(i) { '>' } else { ' ' };
                format!("{marker}{i:>4}  [{}]  {}", format_timestamp(line.time), line.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run the editor REPL until `quit` or end of input.
pub fn run_editor<R: BufRead, W: Write>(
    session: &mut EditorSession,
    store: &LyricsStore,
    mut input: R,
    mut output: W,
) -> Result<()> {
    writeln!(
        output,
        "editing {} - {} ({} lines), 'help' for commands",
        session.song.artist,
        session.song.name,
        session.lines().len()
    )?;

    let mut buf = String::new();
    loop {
        let marker = if session.is_dirty() { "*" } else { "" };
        write!(output, "lyra{marker}> ")?;
        output.flush()?;

        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            if session.is_dirty() {
                writeln!(output, "\nend of input; unsaved changes discarded")?;
            }
            break;
        }
        if buf.trim().is_empty() {
            continue;
        }

        let step = parse_command(&buf).and_then(|command| {
            debug!("Editor command: {command:?}");
            session.apply(command, store)
        });
        match step {
            Ok(Step::Continue(message)) => writeln!(output, "{message}")?,
            Ok(Step::ReadPaste) => {
                writeln!(output, "paste lyrics, end with a line containing only '{PASTE_END}'")?;
                let text = read_paste_block(&mut input)?;
                match session.paste(&text) {
                    Ok(count) => writeln!(output, "appended {count} lines")?,
                    Err(e) => writeln!(output, "error: {e:#}")?,
                }
            }
            Ok(Step::Quit) => break,
            Err(e) => writeln!(output, "error: {e:#}")?,
        }
    }
    Ok(())
}

fn read_paste_block<R: BufRead>(input: &mut R) -> Result<String> {
    let mut text = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 || line.trim_end() == PASTE_END {
            break;
        }
        text.push_str(&line);
    }
    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn store() -> (tempfile::TempDir, LyricsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LyricsStore::with_path(dir.path()).unwrap();
        (dir, store)
    }

    fn session() -> EditorSession {
        EditorSession::new(SongLyrics::new("t1", "Song", "Artist", 180_000), None)
    }

    fn run(session: &mut EditorSession, store: &LyricsStore, script: &str) -> String {
        let mut out = Vec::new();
        run_editor(session, store, Cursor::new(script.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_add_undo_redo() {
        let (_dir, store) = store();
        let mut session = session();

        run(&mut session, &store, "add\nadd @100 x\nundo\nquit!\n");
        assert_eq!(session.lines(), &[LyricLine::blank()]);

        run(&mut session, &store, "redo\nquit!\n");
        assert_eq!(
            session.lines(),
            &[LyricLine::blank(), LyricLine::new(100, "x")]
        );
    }

    #[test]
    fn test_quit_refuses_unsaved() {
        let (_dir, store) = store();
        let mut session = session();

        let out = run(&mut session, &store, "add @0 a\nquit\nsave\nquit\n");
        assert!(out.contains("unsaved changes"));
        assert!(out.contains("saved 1 lines"));
        assert!(!session.is_dirty());
        assert_eq!(store.get_by_track_id("t1").unwrap().unwrap().lyrics.len(), 1);
    }

    #[test]
    fn test_save_sorts_and_sets_baseline() {
        let (_dir, store) = store();
        let mut session = session();

        run(&mut session, &store, "add @2000 b\nadd @1000 a\nsave\nquit\n");
        let stored = store.get_by_track_id("t1").unwrap().unwrap();
        assert_eq!(stored.lyrics[0].text, "a");
        assert_eq!(session.lines(), stored.lyrics.as_slice());
        assert!(!session.history.differs_from_baseline());

        // The sort on save can itself be undone.
        run(&mut session, &store, "undo\nquit!\n");
        assert_eq!(session.lines()[0].text, "b");
    }

    #[test]
    fn test_paste_block_is_one_step() {
        let (_dir, store) = store();
        let mut session = session();

        let out = run(
            &mut session,
            &store,
            "paste\n[00:01.00]one\n[00:02.00]two\n.\nlist\nundo\nquit!\n",
        );
        assert!(out.contains("appended 2 lines"));
        assert!(out.contains("[0:01.00]  one"));
        assert!(session.lines().is_empty());
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let (_dir, store) = store();
        let mut session = session();

        let out = run(&mut session, &store, "rm 5\nbogus\nadd @0 ok\nquit!\n");
        assert!(out.contains("error: Index 5 out of range"));
        assert!(out.contains("unknown command"));
        assert_eq!(session.lines().len(), 1);
    }

    #[test]
    fn test_time_and_move() {
        let (_dir, store) = store();
        let mut session = EditorSession::new(
            SongLyrics::new("t1", "Song", "Artist", 0).with_lyrics(vec![
                LyricLine::new(0, "a"),
                LyricLine::new(1000, "b"),
            ]),
            None,
        );
        assert!(!session.is_dirty());

        session
            .apply(EditorCommand::Time { index: 0, time: 1500 }, &store)
            .unwrap();
        session
            .apply(EditorCommand::Move { from: 0, to: 1 }, &store)
            .unwrap();
        assert_eq!(
            session.lines(),
            &[LyricLine::new(1000, "b"), LyricLine::new(1500, "a")]
        );
        assert!(session.is_dirty());
        assert_eq!(session.history.undo_depth(), 2);
    }

    #[test]
    fn test_at_marks_active_line() {
        let (_dir, store) = store();
        let mut session = EditorSession::new(
            SongLyrics::new("t1", "Song", "Artist", 0).with_lyrics(vec![
                LyricLine::new(0, "a"),
                LyricLine::new(1000, "b"),
                LyricLine::new(3000, "c"),
            ]),
            None,
        );

        let Step::Continue(out) = session
            .apply(EditorCommand::At { time: 1500 }, &store)
            .unwrap()
        else {
            unreachable!("expected output");
        };
        assert!(out.lines().nth(1).unwrap().starts_with('>'));
    }

    #[test]
    fn test_text_keeps_time() {
        let (_dir, store) = store();
        let mut session = session();

        let out = run(&mut session, &store, "add @1500 helo
text 0 hello there
undo
redo
quit!
");
        assert!(out.contains("reworded line 0"));
        assert!(out.contains("undone (1 to undo, 1 to redo)"));
        assert!(out.contains("redone (2 to undo, 0 to redo)"));
        assert_eq!(session.lines(), &[LyricLine::new(1500, "hello there")]);
    }

    #[test]
    fn test_history_depth_caps_undo() {
        let (_dir, store) = store();
        let mut session = EditorSession::new(SongLyrics::new("t1", "Song", "Artist", 0), Some(1));

        let out = run(&mut session, &store, "add a
add b
undo
undo
quit!
");
        assert!(out.contains("nothing to undo"));
        assert_eq!(session.lines(), &[LyricLine::new(0, "a")]);
    }
}
