//! Stored lyrics documents.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::line::{sort_by_time, LyricLine};

/// Lyrics document for a single track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongLyrics {
    /// Streaming-service track ID.
    pub id: String,
    /// Song title.
    pub name: String,
    /// Primary artist name.
    pub artist: String,
    /// Timed lines, sorted by time once saved.
    pub lyrics: Vec<LyricLine>,
    /// Track duration in milliseconds.
    pub duration: u64,
    /// Language of the lyrics, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Creation time (Unix milliseconds).
    pub added_at: i64,
    /// Last save time (Unix milliseconds).
    pub updated_at: i64,
}

impl SongLyrics {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        duration: u64,
    ) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            lyrics: Vec::new(),
            duration,
            language: None,
            added_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: Vec<LyricLine>) -> Self {
        self.lyrics = lyrics;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sort lines by time and stamp the document as saved at `now_ms`.
    ///
    /// A document that was never stamped (`added_at == 0`) also gets its
    /// creation time set.
    pub fn prepare_for_save(&mut self, now_ms: i64) {
        sort_by_time(&mut self.lyrics);
        if self.added_at == 0 {
            self.added_at = now_ms;
        }
        self.updated_at = now_ms;
    }

    /// Short listing form of this document.
    pub fn summary(&self) -> SongSummary {
        SongSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            artist: self.artist.clone(),
            line_count: self.lyrics.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongSummary {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub line_count: usize,
    pub updated_at: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_for_save_sorts_and_stamps() {
        let mut song = SongLyrics::new("t1", "Song", "Artist", 180_000).with_lyrics(vec![
            LyricLine::new(3000, "c"),
            LyricLine::new(0, "a"),
            LyricLine::new(1000, "b"),
        ]);
        song.added_at = 0;

        song.prepare_for_save(42);
        assert_eq!(song.lyrics[0].text, "a");
        assert_eq!(song.lyrics[2].text, "c");
        assert_eq!(song.added_at, 42);
        assert_eq!(song.updated_at, 42);

        song.prepare_for_save(99);
        assert_eq!(song.added_at, 42);
        assert_eq!(song.updated_at, 99);
    }

    #[test]
    fn test_camel_case_round_trip() {
        let json = r#"{
            "id": "abc",
            "name": "Song",
            "artist": "Artist",
            "lyrics": [{"time": 0, "text": "hi"}],
            "duration": 1000,
            "addedAt": 1,
            "updatedAt": 2
        }"#;

        let song: SongLyrics = serde_json::from_str(json).unwrap();
        assert_eq!(song.lyrics, vec![LyricLine::new(0, "hi")]);
        assert_eq!(song.language, None);
        assert_eq!(song.updated_at, 2);

        let out = serde_json::to_string(&song).unwrap();
        assert!(out.contains("\"addedAt\":1"));
        assert!(!out.contains("language"));
    }

    #[test]
    fn test_summary_uses_camel_case() {
        let mut song = SongLyrics::new("abc", "Song", "Artist", 0)
            .with_lyrics(vec![LyricLine::new(0, "a"), LyricLine::new(5, "b")]);
        song.prepare_for_save(7);

        let summary = song.summary();
        assert_eq!(summary.line_count, 2);

        let out = serde_json::to_string(&summary).unwrap();
        assert!(out.contains("\"lineCount\":2"));
        assert!(out.contains("\"updatedAt\":7"));
        assert!(!out.contains("line_count"));
    }
}
