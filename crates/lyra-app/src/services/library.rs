//! Stored-lyrics commands: resolve, import, show, list and delete.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use lyra_core::{find_current_index, EditHistory, SongLyrics, SongSummary, TrackSummary};
use lyra_lyrics::{detect_and_parse, format_timestamp, to_lrc};
use lyra_store::LyricsStore;
use tracing::{debug, info};

use super::session::SpotifySession;
use crate::config::{Config, TrackArgs};
use crate::state::command::parse_signed_time;

/// Find the document to work on without touching the network: the stored
/// one for the track ID, or a new one when title and artist were given.
pub fn resolve_local(store: &LyricsStore, args: &TrackArgs) -> Result<Option<SongLyrics>> {
    let Some(id) = args.track_id.as_deref() else {
        return Ok(None);
    };

    if let Some(mut song) = store.get_by_track_id(id)? {
        if let Some(name) = &args.name {
            song.name.clone_from(name);
        }
        if let Some(artist) = &args.artist {
            song.artist.clone_from(artist);
        }
        if let Some(duration) = args.duration_ms {
            song.duration = duration;
        }
        return Ok(Some(song));
    }

    match (&args.name, &args.artist) {
        (Some(name), Some(artist)) => Ok(Some(SongLyrics::new(
            id,
            name,
            artist,
            args.duration_ms.unwrap_or(0),
        ))),
        _ => Ok(None),
    }
}

/// Find the document to work on, asking Spotify for track metadata when
/// nothing local identifies it.
pub async fn resolve_song(store: &LyricsStore, args: &TrackArgs, config: &Config) -> Result<SongLyrics> {
    if let Some(song) = resolve_local(store, args)? {
        return Ok(song);
    }

    let mut session = SpotifySession::from_config(config)
        .context("Track is not stored; pass --name and --artist or configure a Spotify token")?;
    session.ensure_fresh().await?;

    let track = match (&args.track_id, &args.search) {
        (Some(id), _) => session
            .client()
            .get_track(id)
            .await?
            .with_context(|| format!("Spotify has no track {id}"))?,
        (None, Some(query)) => session
            .client()
            .search_track(query)
            .await?
            .with_context(|| format!("No track found for '{query}'"))?,
        (None, None) => bail!("Give a track ID or --search"),
    };
    debug!("Resolved track {} - {} ({})", track.artist_name(), track.name, track.id);

    if let Some(song) = store.get_by_track_id(&track.id)? {
        return Ok(song);
    }
    Ok(song_from_track(&track))
}

/// A new, empty document for a streaming-service track.
pub fn song_from_track(track: &TrackSummary) -> SongLyrics {
    SongLyrics::new(
        track.id.clone(),
        track.name.clone(),
        track.artists_display(),
        track.duration_ms,
    )
}

/// Parse a lyrics file into `song` and save it. Returns the stored document.
pub fn import_file(
    store: &LyricsStore,
    song: SongLyrics,
    path: &Path,
    replace: bool,
) -> Result<SongLyrics> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lines = detect_and_parse(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let imported = lines.len();

    let mut history = EditHistory::new();
    history.load(song.lyrics.clone());
    if replace {
        history.replace_all(lines);
    } else {
        history.bulk_append(lines);
    }

    let song = store.save(song.with_lyrics(history.into_present()))?;
    info!(
        "Imported {imported} lines into {} ({} total)",
        song.id,
        song.lyrics.len()
    );
    Ok(song)
}

/// Stored lyrics of a track, as a numbered listing or LRC.
pub fn show(store: &LyricsStore, track_id: &str, at: Option<&str>, lrc: bool) -> Result<String> {
    let song = store
        .get_by_track_id(track_id)?
        .with_context(|| format!("No lyrics stored for {track_id}"))?;

    if lrc {
        return Ok(to_lrc(&song.lyrics));
    }

    let active = match at {
        Some(at) => find_current_index(&song.lyrics, parse_signed_time(at)?),
        None => None,
    };

    let mut out = format!("{} - {} ({})\n", song.artist, song.name, song.id);
    for (i, line) in song.lyrics.iter().enumerate() {
        let marker = if active == Some(i) { '>' } else { ' ' };
        writeln!(out, "{marker}{i:>4}  [{}]  {}", format_timestamp(line.time), line.text)?;
    }
    Ok(out)
}

/// One row per stored document.
pub fn list(store: &LyricsStore) -> Result<String> {
    let songs = store.list()?;
    if songs.is_empty() {
        return Ok("(no lyrics stored)\n".to_string());
    }

    let mut out = String::new();
    for song in &songs {
        writeln!(out, "{}", summary_row(song))?;
    }

    let stats = store.stats();
    writeln!(
        out,
        "{} documents, {} lines in {}",
        stats.document_count,
        stats.line_count,
        store.data_dir().display()
    )?;
    Ok(out)
}

/// One listing row: ID, artist, title, line count and last save.
pub fn summary_row(song: &SongSummary) -> String {
    let updated = DateTime::from_timestamp_millis(song.updated_at)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{:<24} {} - {} ({} lines, {updated})",
        song.id, song.artist, song.name, song.line_count
    )
}

/// Delete a stored document.
pub fn delete(store: &LyricsStore, track_id: &str) -> Result<String> {
    if store.delete(track_id)? {
        Ok(format!("deleted lyrics for {track_id}"))
    } else {
        bail!("No lyrics stored for {track_id}")
    }
}
