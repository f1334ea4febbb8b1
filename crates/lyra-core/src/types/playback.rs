//! Playback state reported by the streaming service.

use serde::{Deserialize, Serialize};

use super::TrackSummary;

/// Snapshot of what the account is playing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackState {
    /// Current track; `None` for ads, podcasts or an idle player.
    pub track: Option<TrackSummary>,
    /// Position within the track in milliseconds.
    pub progress_ms: u64,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl PlaybackState {
    /// ID of the current track, if any.
    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.id.as_str())
    }
}

/// Repeat mode for playback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// No repeat.
    #[default]
    Off,
    /// Repeat the current track.
    Track,
    /// Repeat the current album or playlist.
    Context,
}

impl RepeatMode {
    /// Value used by the Web API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Context => "context",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_mode_serde() {
        let mode: RepeatMode = serde_json::from_str("\"context\"").unwrap();
        assert_eq!(mode, RepeatMode::Context);
        assert_eq!(mode.as_str(), "context");
        assert_eq!(RepeatMode::default(), RepeatMode::Off);
    }

    #[test]
    fn test_track_id() {
        let mut state = PlaybackState::default();
        assert_eq!(state.track_id(), None);

        state.track = Some(TrackSummary::new("abc", "Song"));
        assert_eq!(state.track_id(), Some("abc"));
    }
}
