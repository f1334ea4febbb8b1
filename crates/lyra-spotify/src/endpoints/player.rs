//! Player endpoints: playback state and transport controls.

use lyra_core::{Error, PlaybackState, RepeatMode, Result};
use reqwest::Method;
use tracing::debug;

use crate::types::RawPlaybackResponse;
use crate::SpotifyClient;

impl SpotifyClient {
    /// Get what the account is playing.
    ///
    /// Returns `None` when no device is active.
    pub async fn current_playback(&self) -> Result<Option<PlaybackState>> {
        let raw: Option<RawPlaybackResponse> = self
            .get("me/player", &[("additional_types", "track".to_string())])
            .await?;

        let state = raw.map(PlaybackState::from);
        if let Some(state) = &state {
            debug!(
                "Playback: {:?} at {}ms (playing: {})",
                state.track_id(),
                state.progress_ms,
                state.is_playing
            );
        }
        Ok(state)
    }

    /// Start or resume playback.
    pub async fn play(&self) -> Result<()> {
        self.command(Method::PUT, "me/player/play", &[]).await
    }

    /// Pause playback.
    pub async fn pause(&self) -> Result<()> {
        self.command(Method::PUT, "me/player/pause", &[]).await
    }

    /// Skip to the next track.
    pub async fn next(&self) -> Result<()> {
        self.command(Method::POST, "me/player/next", &[]).await
    }

    /// Skip to the previous track.
    pub async fn previous(&self) -> Result<()> {
        self.command(Method::POST, "me/player/previous", &[]).await
    }

    /// Seek within the current track.
    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        self.command(
            Method::PUT,
            "me/player/seek",
            &[("position_ms", position_ms.to_string())],
        )
        .await
    }

    /// Set volume (0-100).
    pub async fn set_volume(&self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(Error::InvalidArgument(format!(
                "Volume must be 0-100, got {percent}"
            )));
        }
        self.command(
            Method::PUT,
            "me/player/volume",
            &[("volume_percent", percent.to_string())],
        )
        .await
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.command(
            Method::PUT,
            "me/player/shuffle",
            &[("state", enabled.to_string())],
        )
        .await
    }

    pub async fn set_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.command(
            Method::PUT,
            "me/player/repeat",
            &[("state", mode.as_str().to_string())],
        )
        .await
    }
}
