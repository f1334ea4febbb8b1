//! Track metadata reported by the streaming service.

use serde::{Deserialize, Serialize};

/// A track as seen by the lyrics side: enough to look up and label lyrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackSummary {
    /// Streaming-service track ID.
    pub id: String,
    /// Track title.
    pub name: String,
    /// Artist name(s).
    pub artists: Vec<TrackArtist>,
    /// Album name (if available).
    pub album: Option<String>,
    /// Track duration in milliseconds.
    pub duration_ms: u64,
}

impl TrackSummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: Vec::new(),
            album: None,
            duration_ms: 0,
        }
    }

    /// Get the primary artist name.
    pub fn artist_name(&self) -> &str {
        self.artists.first().map_or("", |a| a.name.as_str())
    }

    /// Get all artist names joined.
    pub fn artists_display(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Artist reference within a track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackArtist {
    /// Artist ID (if available).
    pub id: Option<String>,
    /// Artist name.
    pub name: String,
}

impl TrackArtist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
