//! # lyra-store
//!
//! Persistent lyrics documents (`SQLite`) for Lyra.
//!
//! One row per track, keyed by the streaming-service track ID. Lines are
//! stored as a JSON array of `{time, text}` records. Recently read documents
//! are kept in an in-memory LRU so the playback loop does not hit the
//! database on every track change.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use directories::ProjectDirs;
use lru::LruCache;
use lyra_core::{Error, LyricLine, Result, SongLyrics, SongSummary};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

const DB_FILE: &str = "lyrics.db";

/// Number of documents kept in memory.
const MEMORY_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

const SELECT_COLUMNS: &str =
    "id, name, artist, language, duration_ms, lines_json, added_at, updated_at";

/// Platform data directory for Lyra, if one can be determined.
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "lyra", "Lyra").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Lyrics document store.
#[derive(Clone)]
pub struct LyricsStore {
    /// `SQLite` database connection.
    db: Arc<Mutex<Connection>>,
    /// Directory holding the database.
    data_dir: PathBuf,
    /// Recently read documents by track ID.
    memory_cache: Arc<Mutex<LruCache<String, SongLyrics>>>,
}

impl LyricsStore {
    /// Open the store in the platform data directory.
    pub fn new() -> Result<Self> {
        let data_dir = default_data_dir()
            .ok_or_else(|| Error::Storage("Failed to determine data directory".to_string()))?;
        Self::with_path(data_dir)
    }

    /// Open (or create) the store in `data_dir`.
    pub fn with_path(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| Error::Storage(format!("Failed to create data directory: {e}")))?;

        let db = Connection::open(data_dir.join(DB_FILE))
            .map_err(|e| Error::Storage(format!("Failed to open database: {e}")))?;

        db.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS lyrics (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                artist TEXT NOT NULL,
                language TEXT,
                duration_ms INTEGER NOT NULL,
                lines_json TEXT NOT NULL,
                added_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_lyrics_artist_name ON lyrics(artist, name);
            ",
        )
        .map_err(|e| Error::Storage(format!("Failed to initialize database: {e}")))?;

        info!("Lyrics store opened at {}", data_dir.display());

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            data_dir,
            memory_cache: Arc::new(Mutex::new(LruCache::new(MEMORY_CACHE_SIZE))),
        })
    }

    /// Directory holding the database.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Look up lyrics by track ID.
    pub fn get_by_track_id(&self, id: &str) -> Result<Option<SongLyrics>> {
        if let Some(song) = self.memory_cache.lock().get(id) {
            debug!("Memory cache hit for {id}");
            return Ok(Some(song.clone()));
        }

        let song = self.query_one(&format!("SELECT {SELECT_COLUMNS} FROM lyrics WHERE id = ?1"), &[id])?;
        if let Some(ref song) = song {
            self.memory_cache.lock().put(song.id.clone(), song.clone());
        }
        Ok(song)
    }

    /// Look up lyrics by exact artist and song title. If several documents
    /// match, the most recently updated wins.
    pub fn get_by_artist_and_title(&self, artist: &str, title: &str) -> Result<Option<SongLyrics>> {
        self.query_one(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM lyrics WHERE artist = ?1 AND name = ?2 \
                 ORDER BY updated_at DESC LIMIT 1"
            ),
            &[artist, title],
        )
    }

    /// Look up lyrics for a playing track: by ID first, then by artist and
    /// title (covers re-releases that got a new ID).
    pub fn find(&self, id: &str, artist: &str, title: &str) -> Result<Option<SongLyrics>> {
        if let Some(song) = self.get_by_track_id(id)? {
            return Ok(Some(song));
        }
        debug!("No lyrics for id {id}, trying {artist} - {title}");
        self.get_by_artist_and_title(artist, title)
    }

    /// Save a document, sorting its lines and stamping `updated_at`.
    /// Returns the document as stored.
    pub fn save(&self, mut song: SongLyrics) -> Result<SongLyrics> {
        song.prepare_for_save(Utc::now().timestamp_millis());
        let lines_json = serde_json::to_string(&song.lyrics)?;

        {
            let db = self.db.lock();
            db.execute(
                "INSERT OR REPLACE INTO lyrics
                    (id, name, artist, language, duration_ms, lines_json, added_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    song.id,
                    song.name,
                    song.artist,
                    song.language,
                    song.duration as i64,
                    lines_json,
                    song.added_at,
                    song.updated_at,
                ],
            )
            .map_err(|e| Error::Storage(format!("Failed to save lyrics: {e}")))?;
        }

        self.memory_cache.lock().put(song.id.clone(), song.clone());
        info!(
            "Saved {} lyric lines for {} - {} ({})",
            song.lyrics.len(),
            song.artist,
            song.name,
            song.id
        );
        Ok(song)
    }

    /// Delete a document. Returns whether one existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .db
            .lock()
            .execute("DELETE FROM lyrics WHERE id = ?1", [id])
            .map_err(|e| Error::Storage(format!("Failed to delete lyrics: {e}")))?;

        self.memory_cache.lock().pop(id);
        if removed > 0 {
            info!("Deleted lyrics for {id}");
        }
        Ok(removed > 0)
    }

    /// All stored documents, ordered by artist then title.
    pub fn list(&self) -> Result<Vec<SongSummary>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT id, name, artist, json_array_length(lines_json), updated_at
                 FROM lyrics ORDER BY artist, name",
            )
            .map_err(|e| Error::Storage(format!("Failed to list lyrics: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SongSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    artist: row.get(2)?,
                    line_count: row.get::<_, i64>(3)? as usize,
                    updated_at: row.get(4)?,
                })
            })
            .map_err(|e| Error::Storage(format!("Failed to list lyrics: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Storage(format!("Failed to read lyrics row: {e}")))
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        let db = self.db.lock();

        let document_count: i64 = db
            .query_row("SELECT COUNT(*) FROM lyrics", [], |row| row.get(0))
            .unwrap_or(0);

        let line_count: i64 = db
            .query_row(
                "SELECT COALESCE(SUM(json_array_length(lines_json)), 0) FROM lyrics",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        StoreStats {
            document_count: document_count as usize,
            line_count: line_count as usize,
            cached_count: self.memory_cache.lock().len(),
        }
    }

    /// Drop the in-memory cache. Stored documents are untouched.
    pub fn clear_memory_cache(&self) {
        self.memory_cache.lock().clear();
    }

    fn query_one(&self, sql: &str, params: &[&str]) -> Result<Option<SongLyrics>> {
        let db = self.db.lock();
        let row = db
            .query_row(sql, rusqlite::params_from_iter(params), read_row)
            .optional()
            .map_err(|e| Error::Storage(format!("Failed to query lyrics: {e}")))?;

        row.map(StoredRow::into_song).transpose()
    }
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored documents.
    pub document_count: usize,
    /// Total lyric lines across all documents.
    pub line_count: usize,
    /// Documents currently held in memory.
    pub cached_count: usize,
}

/// Raw row before the lines JSON is decoded.
struct StoredRow {
    song: SongLyrics,
    lines_json: String,
}

impl StoredRow {
    fn into_song(self) -> Result<SongLyrics> {
        let mut song = self.song;
        song.lyrics = serde_json::from_str::<Vec<LyricLine>>(&self.lines_json)?;
        Ok(song)
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        song: SongLyrics {
            id: row.get(0)?,
            name: row.get(1)?,
            artist: row.get(2)?,
            language: row.get(3)?,
            duration: row.get::<_, i64>(4)?.max(0) as u64,
            lyrics: Vec::new(),
            added_at: row.get(6)?,
            updated_at: row.get(7)?,
        },
        lines_json: row.get(5)?,
    })
}
