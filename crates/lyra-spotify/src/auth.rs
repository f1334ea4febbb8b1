//! Access tokens and token refresh.

use chrono::{DateTime, Duration, Utc};
use lyra_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{map_transport_error, status_error, SpotifyClient};

/// Tokens are treated as expired this long before their real expiry, so a
/// request never races the deadline.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token for the Web API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    /// `None` when the expiry is unknown (token supplied by the user).
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// A token with unknown expiry.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// A token valid for `expires_in_secs` from `now`.
    pub fn expiring(value: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(now + Duration::seconds(expires_in_secs)),
        }
    }

    /// Whether the token should be refreshed before use at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= at)
    }
}

/// Application credentials used for token refresh.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Result of a token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: AccessToken,
    /// The refresh token to use next time. The service may rotate it; when it
    /// does not, the one used for the refresh is carried over.
    pub refresh_token: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

impl RawTokenResponse {
    fn into_token_set(self, previous_refresh: &str, now: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: AccessToken::expiring(self.access_token, self.expires_in, now),
            refresh_token: self
                .refresh_token
                .unwrap_or_else(|| previous_refresh.to_string()),
        }
    }
}

impl SpotifyClient {
    /// Exchange a refresh token for a new access token.
    ///
    /// The client itself is unchanged; use [`SpotifyClient::with_token`] with
    /// the returned token.
    pub async fn refresh(&self, credentials: &Credentials, refresh_token: &str) -> Result<TokenSet> {
        if refresh_token.is_empty() {
            return Err(Error::InvalidArgument("Refresh token is required".to_string()));
        }

        debug!("Refreshing access token");
        let response = self
            .http
            .post(&self.accounts_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if let Some(error) = status_error(status, response.headers()) {
            let body = response.text().await.unwrap_or_default();
            return Err(if error.is_rate_limited() {
                error
            } else {
                Error::Api(format!("Token refresh failed ({status}): {body}"))
            });
        }

        let raw: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse token response: {e}")))?;

        let tokens = raw.into_token_set(refresh_token, Utc::now());
        info!("Access token refreshed");
        Ok(tokens)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, TestServer};

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        let token = AccessToken::expiring("t", 3600, now);
        assert!(!token.is_expired(now));
        assert!(!token.is_expired(now + Duration::seconds(3500)));
        assert!(token.is_expired(now + Duration::seconds(3550)));
        assert!(!AccessToken::new("t").is_expired(now + Duration::days(365)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!(
            "{:?} {:?}",
            AccessToken::new("tok-123"),
            Credentials::new("id", "secret-456")
        );
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("secret-456"));
        assert!(debug.contains("id"));
    }

    #[test]
    fn test_refresh_token_carried_over() {
        let now = Utc::now();
        let raw: RawTokenResponse =
            serde_json::from_str(r#"{"access_token":"new","token_type":"Bearer","expires_in":3600}"#)
                .unwrap();
        let tokens = raw.into_token_set("old-refresh", now);
        assert_eq!(tokens.access_token.value, "new");
        assert_eq!(tokens.refresh_token, "old-refresh");
        assert_eq!(tokens.access_token.expires_at, Some(now + Duration::seconds(3600)));
    }

    #[tokio::test]
    async fn test_refresh_round_trip() {
        let server = TestServer::start(vec![Reply::json(
            200,
            r#"{"access_token":"fresh","token_type":"Bearer","expires_in":3600,"refresh_token":"rotated"}"#,
        )])
        .await;

        let client = SpotifyClient::new(AccessToken::new("stale"))
            .unwrap()
            .with_accounts_url(format!("{}/api/token", server.url()));
        let tokens = client
            .refresh(&Credentials::new("cid", "csecret"), "r1")
            .await
            .unwrap();

        assert_eq!(tokens.access_token.value, "fresh");
        assert_eq!(tokens.refresh_token, "rotated");
        // The original client keeps its token.
        assert_eq!(client.token().value, "stale");

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /api/token "));
        assert!(request.contains("grant_type=refresh_token"));
        assert!(request.contains("refresh_token=r1"));
        assert!(request.to_ascii_lowercase().contains("authorization: basic "));
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = TestServer::start(vec![Reply::json(400, r#"{"error":"invalid_grant"}"#)]).await;
        let client = SpotifyClient::new(AccessToken::new("stale"))
            .unwrap()
            .with_accounts_url(server.url());

        let err = client
            .refresh(&Credentials::new("cid", "csecret"), "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ref msg) if msg.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn test_empty_refresh_token() {
        let client = SpotifyClient::new(AccessToken::new("t")).unwrap();
        let err = client
            .refresh(&Credentials::new("cid", "csecret"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
