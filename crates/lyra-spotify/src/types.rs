//! Web API response structures and their conversion into core types.

use lyra_core::{PlaybackState, RepeatMode, TrackArtist, TrackSummary};
use serde::Deserialize;

/// `GET /me/player` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlaybackResponse {
    #[serde(default)]
    pub item: Option<RawItem>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub repeat_state: Option<RepeatMode>,
    /// "track", "episode", "ad" or "unknown".
    #[serde(default)]
    pub currently_playing_type: Option<String>,
}

impl From<RawPlaybackResponse> for PlaybackState {
    fn from(raw: RawPlaybackResponse) -> Self {
        let is_track = raw
            .currently_playing_type
            .as_deref()
            .map_or(true, |kind| kind == "track");

        Self {
            track: raw
                .item
                .filter(|_| is_track)
                .and_then(RawItem::into_track),
            progress_ms: raw.progress_ms.unwrap_or(0),
            is_playing: raw.is_playing,
            shuffle: raw.shuffle_state,
            repeat: raw.repeat_state.unwrap_or_default(),
        }
    }
}

/// A playable item: a track, or an episode when podcasts play.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    /// Local files have no ID.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    #[serde(default)]
    pub album: Option<RawAlbum>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl RawItem {
    /// Convert to a track summary. Episodes and ID-less local files are
    /// dropped since no lyrics can be keyed to them.
    pub fn into_track(self) -> Option<TrackSummary> {
        if self.kind.as_deref().is_some_and(|kind| kind != "track") {
            return None;
        }
        let id = self.id?;

        Some(TrackSummary {
            id,
            name: self.name,
            artists: self
                .artists
                .into_iter()
                .map(|a| match a.id {
                    Some(id) => TrackArtist::new(a.name).with_id(id),
                    None => TrackArtist::new(a.name),
                })
                .collect(),
            album: self.album.map(|a| a.name),
            duration_ms: self.duration_ms,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAlbum {
    pub name: String,
}

/// `GET /search` response (tracks only).
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub tracks: Option<RawPaging<RawItem>>,
}

/// Paged list wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPaging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PLAYBACK: &str = r#"{
        "device": {"id": "d1", "name": "Laptop", "volume_percent": 60},
        "shuffle_state": true,
        "repeat_state": "context",
        "timestamp": 1700000000000,
        "progress_ms": 43210,
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "type": "track",
            "duration_ms": 213573,
            "album": {"name": "Whenever You Need Somebody", "id": "a1"},
            "artists": [{"id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley"}]
        }
    }"#;

    #[test]
    fn test_playback_conversion() {
        let raw: RawPlaybackResponse = serde_json::from_str(PLAYBACK).unwrap();
        let state = PlaybackState::from(raw);

        assert!(state.is_playing);
        assert!(state.shuffle);
        assert_eq!(state.repeat, RepeatMode::Context);
        assert_eq!(state.progress_ms, 43_210);

        let track = state.track.unwrap();
        assert_eq!(track.id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(track.artist_name(), "Rick Astley");
        assert_eq!(track.album.as_deref(), Some("Whenever You Need Somebody"));
        assert_eq!(track.duration_ms, 213_573);
    }

    #[test]
    fn test_episode_has_no_track() {
        let raw: RawPlaybackResponse = serde_json::from_str(
            r#"{
                "progress_ms": 1000,
                "is_playing": true,
                "currently_playing_type": "episode",
                "item": {"id": "e1", "name": "Podcast", "type": "episode", "duration_ms": 5}
            }"#,
        )
        .unwrap();
        let state = PlaybackState::from(raw);
        assert!(state.track.is_none());
        assert_eq!(state.progress_ms, 1000);
    }

    #[test]
    fn test_local_file_without_id() {
        let item: RawItem =
            serde_json::from_str(r#"{"id": null, "name": "demo.mp3", "type": "track"}"#).unwrap();
        assert!(item.into_track().is_none());
    }

    #[test]
    fn test_ad_break() {
        let raw: RawPlaybackResponse = serde_json::from_str(
            r#"{"item": null, "is_playing": true, "currently_playing_type": "ad"}"#,
        )
        .unwrap();
        let state = PlaybackState::from(raw);
        assert!(state.track.is_none());
        assert_eq!(state.repeat, RepeatMode::Off);
    }
}
