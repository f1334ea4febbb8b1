//! Spotify client plus what is needed to keep its token fresh.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use lyra_spotify::{Credentials, SpotifyClient};
use tracing::{info, warn};

use crate::config::Config;

/// Whether a failed refresh may succeed if tried again later.
pub fn is_transient(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<lyra_core::Error>()
        .is_some_and(lyra_core::Error::is_retryable)
}

/// An authorized client that can renew its own access token.
#[derive(Debug)]
pub struct SpotifySession {
    client: SpotifyClient,
    credentials: Option<Credentials>,
    refresh_token: Option<String>,
}

impl SpotifySession {
    pub fn new(
        client: SpotifyClient,
        credentials: Option<Credentials>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            refresh_token,
        }
    }

    /// Build a session from configuration. Fails if no token is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.require_spotify_client()?;
        let session = Self::new(client, config.credentials(), config.refresh_token.clone());
        if session.refresh_token.is_some() && session.credentials.is_none() {
            warn!("Refresh token set without client ID and secret; it will not be used");
        }
        Ok(session)
    }

    pub const fn client(&self) -> &SpotifyClient {
        &self.client
    }

    /// Whether [`SpotifySession::refresh`] can succeed at all.
    pub fn can_refresh(&self) -> bool {
        self.credentials.is_some() && self.refresh_token.is_some()
    }

    /// Refresh the token if it is known to be expired.
    pub async fn ensure_fresh(&mut self) -> Result<()> {
        if self.client.token().is_expired(Utc::now()) {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Exchange the refresh token for a new access token and switch the
    /// client over to it.
    pub async fn refresh(&mut self) -> Result<()> {
        let (Some(credentials), Some(refresh_token)) = (&self.credentials, &self.refresh_token)
        else {
            bail!(
                "Spotify token expired or rejected and cannot be refreshed; \
                 set LYRA_SPOTIFY_REFRESH_TOKEN, LYRA_SPOTIFY_CLIENT_ID and LYRA_SPOTIFY_CLIENT_SECRET"
            );
        };

        let tokens = self
            .client
            .refresh(credentials, refresh_token)
            .await
            .context("Failed to refresh Spotify token")?;

        self.client = self.client.with_token(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
        info!("Refreshed Spotify access token");
        Ok(())
    }
}
