//! Command-line and environment configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lyra_core::RepeatMode;
use lyra_spotify::{AccessToken, Credentials, SpotifyClient};
use lyra_store::LyricsStore;

/// Synchronized lyrics for what you are playing.
#[derive(Debug, Parser)]
#[command(name = "lyra", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow playback and print each lyric line as it becomes active.
    Follow,
    /// Edit the lyrics of a track interactively.
    Edit(TrackArgs),
    /// Import LRC, TTML or plain-text lyrics from a file.
    Import {
        #[command(flatten)]
        track: TrackArgs,
        /// File to read lyrics from.
        #[arg(long, short)]
        file: PathBuf,
        /// Replace existing lines instead of appending.
        #[arg(long)]
        replace: bool,
    },
    /// Print the stored lyrics of a track.
    Show {
        track_id: String,
        /// Mark the line active at this position (ms or m:ss.xx).
        #[arg(long)]
        at: Option<String>,
        /// Print as LRC.
        #[arg(long)]
        lrc: bool,
    },
    /// List stored lyrics documents.
    List,
    /// Delete the stored lyrics of a track.
    Delete { track_id: String },
    /// Control Spotify playback.
    #[command(subcommand)]
    Player(PlayerAction),
}

#[derive(Debug, Clone, Subcommand)]
pub enum PlayerAction {
    Play,
    Pause,
    Next,
    #[command(alias = "prev")]
    Previous,
    /// Jump to a position (ms or m:ss.xx).
    Seek { position: String },
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    Shuffle {
        #[arg(value_enum)]
        state: Toggle,
    },
    Repeat {
        #[arg(value_enum)]
        mode: RepeatArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Command-line form of [`RepeatMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatArg {
    Off,
    Track,
    Context,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => Self::Off,
            RepeatArg::Track => Self::Track,
            RepeatArg::Context => Self::Context,
        }
    }
}

impl PlayerAction {
    /// Name for error messages.
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Play => "resume playback",
            Self::Pause => "pause playback",
            Self::Next => "skip to the next track",
            Self::Previous => "go back a track",
            Self::Seek { .. } => "seek",
            Self::Volume { .. } => "set volume",
            Self::Shuffle { .. } => "set shuffle",
            Self::Repeat { .. } => "set repeat mode",
        }
    }
}

/// Identifies the track being edited or imported.
#[derive(Debug, Clone, Args)]
pub struct TrackArgs {
    /// Streaming-service track ID.
    #[arg(required_unless_present = "search")]
    pub track_id: Option<String>,
    /// Pick the track by searching the streaming service instead.
    #[arg(long, conflicts_with = "track_id")]
    pub search: Option<String>,
    /// Song title (for tracks not stored yet).
    #[arg(long)]
    pub name: Option<String>,
    /// Artist name (for tracks not stored yet).
    #[arg(long)]
    pub artist: Option<String>,
    /// Track duration in milliseconds.
    #[arg(long)]
    pub duration_ms: Option<u64>,
}

/// Settings shared by every command. Each falls back to an environment
/// variable.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding the lyrics database.
    #[arg(long, env = "LYRA_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Spotify access token.
    #[arg(long, env = "LYRA_SPOTIFY_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    /// Spotify refresh token, used when the access token is rejected.
    #[arg(long, env = "LYRA_SPOTIFY_REFRESH_TOKEN", global = true, hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Spotify application client ID.
    #[arg(long, env = "LYRA_SPOTIFY_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// Spotify application client secret.
    #[arg(long, env = "LYRA_SPOTIFY_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// How often `follow` polls playback, in milliseconds.
    #[arg(long, env = "LYRA_POLL_INTERVAL_MS", default_value_t = 1000, global = true,
          value_parser = clap::value_parser!(u64).range(100..))]
    pub poll_interval_ms: u64,

    /// Undo steps the editor keeps; unlimited when unset.
    #[arg(long, env = "LYRA_HISTORY_DEPTH", global = true,
          value_parser = clap::value_parser!(u64).range(1..).map(|n| usize::try_from(n).unwrap_or(usize::MAX)))]
    pub history_depth: Option<usize>,
}

impl Config {
    /// Open the lyrics store in the configured or platform data directory.
    pub fn open_store(&self) -> Result<LyricsStore> {
        let store = match &self.data_dir {
            Some(dir) => LyricsStore::with_path(dir.clone()),
            None => LyricsStore::new(),
        };
        store.context("Failed to open lyrics store")
    }

    /// Credentials for token refresh, if both halves are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(Credentials::new(id, secret)),
            _ => None,
        }
    }

    /// Build a Spotify client, if an access or refresh token is configured.
    ///
    /// With only a refresh token the client starts with an already-expired
    /// token so that the first request refreshes it.
    pub fn spotify_client(&self) -> Result<Option<SpotifyClient>> {
        let token = match (&self.access_token, &self.refresh_token) {
            (Some(token), _) => AccessToken::new(token),
            (None, Some(_)) => AccessToken {
                value: String::new(),
                expires_at: Some(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH),
            },
            (None, None) => return Ok(None),
        };
        let client = SpotifyClient::new(token).context("Failed to create Spotify client")?;
        Ok(Some(client))
    }

    /// Like [`Config::spotify_client`], but a missing token is an error.
    pub fn require_spotify_client(&self) -> Result<SpotifyClient> {
        self.spotify_client()?.context(
            "No Spotify token configured; set LYRA_SPOTIFY_ACCESS_TOKEN or LYRA_SPOTIFY_REFRESH_TOKEN",
        )
    }
}
