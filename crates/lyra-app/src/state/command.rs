//! Editor command parsing.

use anyhow::{anyhow, bail, Context, Result};
use lyra_lyrics::parse_timestamp;

/// One line of editor input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    List,
    /// Append a line. Without a time the line starts at 0.
    Add { time: Option<u64>, text: String },
    Set { index: usize, time: u64, text: String },
    /// Change only the time of a line.
    Time { index: usize, time: u64 },
    /// Change only the words of a line.
    Text { index: usize, text: String },
    Remove { index: usize },
    Move { from: usize, to: usize },
    /// Read a block of lyric text and append it.
    Paste,
    /// Sort lines by time as one undoable step.
    Sort,
    /// Show which line is active at a position.
    At { time: i64 },
    Undo,
    Redo,
    Save,
    Quit { force: bool },
    Help,
}

/// Prefix marking the optional time of `add`.
const TIME_MARKER: char = '@';

pub const HELP: &str = "\
commands:
  list                      show lines
  add [@time] <text>        append a line (time defaults to 0)
  set <i> <time> <text>     replace line i
  time <i> <time>           retime line i
  text <i> <text>           reword line i
  rm <i>                    remove line i
  mv <from> <to>            move a line
  paste                     append LRC/TTML/plain text, end with a single '.'
  sort                      sort lines by time
  at <time>                 show the line active at a time
  undo | redo
  save
  quit | quit!
times are milliseconds (1500) or clock values (0:01.50, 1.5)";

/// Parse one input line.
pub fn parse_command(input: &str) -> Result<EditorCommand> {
    let input = input.trim();
    let (word, rest) = input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(w, r)| (w, r.trim()));

    let command = match word {
        "list" | "ls" => EditorCommand::List,
        "add" => parse_add(rest)?,
        "set" => {
            let (index, rest) = take_index(rest)?;
            let (time, text) = take_time(rest)?;
            EditorCommand::Set {
                index,
                time,
                text: text.to_string(),
            }
        }
        "time" => {
            let (index, rest) = take_index(rest)?;
            let (time, _) = take_time(rest)?;
            EditorCommand::Time { index, time }
        }
        "text" => {
            let (index, text) = take_index(rest)?;
            EditorCommand::Text {
                index,
                text: text.to_string(),
            }
        }
        "rm" | "remove" => EditorCommand::Remove {
            index: take_index(rest)?.0,
        },
        "mv" | "move" => {
            let (from, rest) = take_index(rest)?;
            let (to, _) = take_index(rest)?;
            EditorCommand::Move { from, to }
        }
        "paste" => EditorCommand::Paste,
        "sort" => EditorCommand::Sort,
        "at" => EditorCommand::At {
            time: parse_signed_time(rest)?,
        },
        "undo" | "u" => EditorCommand::Undo,
        "redo" | "r" => EditorCommand::Redo,
        "save" | "w" => EditorCommand::Save,
        "quit" | "q" => EditorCommand::Quit { force: false },
        "quit!" | "q!" => EditorCommand::Quit { force: true },
        "help" | "?" => EditorCommand::Help,
        "" => bail!("empty command"),
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(command)
}

fn parse_add(rest: &str) -> Result<EditorCommand> {
    // Only an `@`-prefixed first token is a time, so lyrics may start with
    // a number.
    let Some(timed) = rest.strip_prefix(TIME_MARKER) else {
        return Ok(EditorCommand::Add {
            time: None,
            text: rest.to_string(),
        });
    };
    let (time, text) = take_time(timed)?;
    Ok(EditorCommand::Add {
        time: Some(time),
        text: text.trim().to_string(),
    })
}

fn take_index(input: &str) -> Result<(usize, &str)> {
    let (token, rest) = split_token(input);
    let index = token
        .parse()
        .with_context(|| format!("expected a line number, got '{token}'"))?;
    Ok((index, rest))
}

fn take_time(input: &str) -> Result<(u64, &str)> {
    let (token, rest) = split_token(input);
    let time = parse_timestamp(token).with_context(|| format!("expected a time, got '{token}'"))?;
    Ok((time, rest))
}

/// Parse a time that may be negative (before the first line).
pub fn parse_signed_time(input: &str) -> Result<i64> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(abs) => (true, abs),
        None => (false, input),
    };
    let magnitude = i64::try_from(parse_timestamp(digits)?)
        .map_err(|_| anyhow!("time '{input}' is out of range"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(t, r)| (t, r.trim_start()))
}
