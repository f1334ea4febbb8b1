//! TTML parser for lyrics.

use lyra_core::{sort_by_time, Error, LyricLine};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::timestamp::parse_clock;

/// Parse TTML lyrics into timed lines.
///
/// Each `<p begin="..">` becomes one line; its `<span>` children are joined
/// into the line text. Word-level timing is dropped.
pub fn parse_ttml(ttml: &str) -> Result<Vec<LyricLine>, Error> {
    let mut reader = Reader::from_str(ttml);
    // Don't trim text - we need spaces between spans
    reader.config_mut().trim_text(false);

    let mut lines = Vec::new();
    let mut current: Option<TtmlLine> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"tt" => saw_root = true,
                    b"p" => {
                        let mut line = TtmlLine::default();
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == b"begin" {
                                let value = std::str::from_utf8(&attr.value).unwrap_or("");
                                line.begin = parse_clock(value);
                            }
                        }
                        current = Some(line);
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"br" {
                    if let Some(ref mut line) = current {
                        line.text.push(' ');
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut line) = current {
                    let text = e.unescape().unwrap_or_default();
                    if text.trim().is_empty() {
                        // Whitespace between spans separates words; runs are
                        // collapsed when the line is finished.
                        line.text.push(' ');
                    } else {
                        line.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    if let Some(line) = current.take() {
                        push_line(&mut lines, line);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Parse(format!(
                    "Malformed TTML at byte {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::Parse("Missing <tt> root element".to_string()));
    }

    sort_by_time(&mut lines);
    Ok(lines)
}

fn push_line(lines: &mut Vec<LyricLine>, line: TtmlLine) {
    let text = line.text.split_whitespace().collect::<Vec<_>>().join(" ");
    match line.begin {
        Some(begin) if !text.is_empty() => lines.push(LyricLine::new(begin, text)),
        Some(_) => {}
        None => debug!("Skipping TTML line without begin time: {text}"),
    }
}

/// Temporary struct for parsing a line.
#[derive(Default)]
struct TtmlLine {
    text: String,
    begin: Option<u64>,
}
