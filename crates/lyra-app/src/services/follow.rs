//! Follow playback and print lyric lines as they become active.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use lyra_core::{LineChange, LineTracker, PlaybackState, TrackSummary};
use lyra_store::LyricsStore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::session::{is_transient, SpotifySession};

/// Fallback wait when a rate-limit response carries no Retry-After.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// Something worth showing while following playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowEvent {
    /// A different track started. `line_count` is 0 when nothing is stored.
    TrackChanged {
        track: TrackSummary,
        line_count: usize,
    },
    /// A new line became active.
    Line(LineChange),
    /// Nothing is playing any more.
    Stopped,
}

/// What the follow loop does after one playback poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Show these events.
    Events(Vec<FollowEvent>),
    /// Get a new access token before the next poll.
    Refresh,
    /// Rate limited: pause this long.
    Wait(Duration),
    /// Log this and poll again on the next tick.
    Skip(String),
}

/// Turns playback snapshots into [`FollowEvent`]s.
pub struct LyricsFollower {
    store: LyricsStore,
    track_id: Option<String>,
    tracker: LineTracker,
    /// Set after a refresh until a poll succeeds. A rejection while set
    /// means the new token is no good either.
    token_refreshed: bool,
}

impl LyricsFollower {
    pub fn new(store: LyricsStore) -> Self {
        Self {
            store,
            track_id: None,
            tracker: LineTracker::default(),
            token_refreshed: false,
        }
    }

    /// Decide what to do with the result of one playback poll.
    ///
    /// A rejected token is refreshed once. A second rejection in a row, or
    /// one that cannot be refreshed, ends following with an error.
    pub fn on_poll(
        &mut self,
        result: lyra_core::Result<Option<PlaybackState>>,
        can_refresh: bool,
    ) -> Result<Tick> {
        match result {
            Ok(state) => {
                self.token_refreshed = false;
                Ok(match self.on_playback(state.as_ref()) {
                    Ok(events) => Tick::Events(events),
                    Err(e) => Tick::Skip(format!("{e:#}")),
                })
            }
            Err(e) if e.is_unauthorized() => {
                if self.token_refreshed || !can_refresh {
                    return Err(e).context("Spotify rejected the access token");
                }
                Ok(Tick::Refresh)
            }
            Err(lyra_core::Error::RateLimited { retry_after_secs }) => Ok(Tick::Wait(
                retry_after_secs.map_or(DEFAULT_RATE_LIMIT_WAIT, Duration::from_secs),
            )),
            Err(e) => Ok(Tick::Skip(format!("Failed to get playback state: {e}"))),
        }
    }

    /// Note that the token was just refreshed after a rejection.
    pub fn mark_token_refreshed(&mut self) {
        self.token_refreshed = true;
    }

    /// Feed the latest playback state (`None` when no device is active).
    pub fn on_playback(&mut self, state: Option<&PlaybackState>) -> Result<Vec<FollowEvent>> {
        let mut events = Vec::new();

        let Some((state, track)) = state.and_then(|s| s.track.as_ref().map(|t| (s, t))) else {
            if self.track_id.take().is_some() {
                self.tracker.reset(Vec::new());
                events.push(FollowEvent::Stopped);
            }
            return Ok(events);
        };

        if self.track_id.as_deref() != Some(track.id.as_str()) {
            let lines = self
                .store
                .find(&track.id, track.artist_name(), &track.name)
                .context("Failed to look up lyrics")?
                .map(|song| song.lyrics)
                .unwrap_or_default();

            info!(
                "Now playing {} - {} ({} lines)",
                track.artist_name(),
                track.name,
                lines.len()
            );
            events.push(FollowEvent::TrackChanged {
                track: track.clone(),
                line_count: lines.len(),
            });
            self.track_id = Some(track.id.clone());
            self.tracker.reset(lines);
        }

        let progress = i64::try_from(state.progress_ms).unwrap_or(i64::MAX);
        if let Some(change) = self.tracker.update(progress) {
            events.push(FollowEvent::Line(change));
        }
        Ok(events)
    }
}

/// Write an event for the terminal.
pub fn print_event<W: Write>(out: &mut W, event: &FollowEvent) -> std::io::Result<()> {
    match event {
        FollowEvent::TrackChanged { track, line_count } => {
            writeln!(out, "\n# {} - {}", track.artists_display(), track.name)?;
            if *line_count == 0 {
                writeln!(out, "(no lyrics stored; add some with `lyra edit {}`)", track.id)?;
            }
        }
        FollowEvent::Line(change) => writeln!(out, "{}", change.line.text)?,
        FollowEvent::Stopped => writeln!(out, "\n(nothing playing)")?,
    }
    out.flush()
}

/// Poll playback until Ctrl-C, printing lyrics to stdout.
pub async fn run_follow(
    mut session: SpotifySession,
    store: LyricsStore,
    poll_interval: Duration,
) -> Result<()> {
    let mut follower = LyricsFollower::new(store);
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut stdout = std::io::stdout();

    info!("Following playback every {}ms", poll_interval.as_millis());
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        if let Err(e) = session.ensure_fresh().await {
            if !is_transient(&e) {
                return Err(e);
            }
            warn!("{e:#}; retrying next poll");
            continue;
        }

        let result = session.client().current_playback().await;
        match follower.on_poll(result, session.can_refresh())? {
            Tick::Events(events) => {
                for event in &events {
                    print_event(&mut stdout, event)?;
                }
            }
            Tick::Refresh => {
                debug!("Access token rejected, refreshing");
                match session.refresh().await {
                    Ok(()) => follower.mark_token_refreshed(),
                    Err(e) if is_transient(&e) => warn!("{e:#}; retrying next poll"),
                    Err(e) => return Err(e),
                }
            }
            Tick::Wait(wait) => {
                warn!("Rate limited, pausing for {}s", wait.as_secs());
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Stopping");
                        return Ok(());
                    }
                    () = tokio::time::sleep(wait) => {}
                }
            }
            Tick::Skip(reason) => warn!("{reason}"),
        }
    }
}
