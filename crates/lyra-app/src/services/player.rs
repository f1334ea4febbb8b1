//! One-shot transport controls.

use anyhow::{Context, Result};
use lyra_lyrics::parse_timestamp;
use tracing::debug;

use super::session::SpotifySession;
use crate::config::PlayerAction;

/// Send one player command, refreshing the token once if it is rejected.
pub async fn control(session: &mut SpotifySession, action: &PlayerAction) -> Result<()> {
    session.ensure_fresh().await?;

    match send(session, action).await {
        Err(e) if e.is_unauthorized() && session.can_refresh() => {
            debug!("Access token rejected, refreshing");
            session.refresh().await?;
            send(session, action).await
        }
        result => result,
    }
    .with_context(|| format!("Failed to {}", action.verb()))
}

async fn send(session: &SpotifySession, action: &PlayerAction) -> lyra_core::Result<()> {
    let client = session.client();
    match action {
        PlayerAction::Play => client.play().await,
        PlayerAction::Pause => client.pause().await,
        PlayerAction::Next => client.next().await,
        PlayerAction::Previous => client.previous().await,
        PlayerAction::Seek { position } => client.seek(parse_timestamp(position)?).await,
        PlayerAction::Volume { percent } => client.set_volume(*percent).await,
        PlayerAction::Shuffle { state } => client.set_shuffle(state.is_on()).await,
        PlayerAction::Repeat { mode } => client.set_repeat((*mode).into()).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{RepeatArg, Toggle};
    use lyra_spotify::test_server::{Reply, TestServer};
    use lyra_spotify::{AccessToken, Credentials, SpotifyClient};

    const TOKEN_REPLY: &str =
        r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3600,"refresh_token":"rotated"}"#;

    fn session_for(server: &TestServer, credentials: Option<Credentials>) -> SpotifySession {
        let client = SpotifyClient::new(AccessToken::new("stale"))
            .unwrap()
            .with_base_url(server.url())
            .with_accounts_url(format!("{}/api/token", server.url()));
        SpotifySession::new(client, credentials, Some("r1".into()))
    }

    #[tokio::test]
    async fn test_rejected_token_is_refreshed_and_resent() {
        let server = TestServer::start(vec![
            Reply::status(401),
            Reply::json(200, TOKEN_REPLY),
            Reply::status(204),
        ])
        .await;
        let mut session = session_for(&server, Some(Credentials::new("cid", "csecret")));

        control(&mut session, &PlayerAction::Shuffle { state: Toggle::On })
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with("PUT /me/player/shuffle?state=true "));
        assert!(requests[1].starts_with("POST /api/token "));
        assert!(requests[2].starts_with("PUT /me/player/shuffle?state=true "));
        assert!(requests[2]
            .to_ascii_lowercase()
            .contains("authorization: bearer fresh"));
    }

    #[tokio::test]
    async fn test_second_rejection_is_an_error() {
        let server = TestServer::start(vec![
            Reply::status(401),
            Reply::json(200, TOKEN_REPLY),
            Reply::status(401),
        ])
        .await;
        let mut session = session_for(&server, Some(Credentials::new("cid", "csecret")));

        let err = control(&mut session, &PlayerAction::Repeat { mode: RepeatArg::Context })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("set repeat mode"));
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_rejection_without_credentials_is_not_refreshed() {
        let server = TestServer::start(vec![Reply::status(401), Reply::json(200, TOKEN_REPLY)]).await;
        let mut session = session_for(&server, None);

        assert!(control(&mut session, &PlayerAction::Pause).await.is_err());
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("PUT /me/player/pause "));
    }
}
