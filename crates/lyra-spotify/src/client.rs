//! Spotify Web API client implementation.

use std::time::Duration;

use lyra_core::{Error, HttpError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AccessToken;

pub(crate) const API_BASE_URL: &str = "https://api.spotify.com/v1";
pub(crate) const ACCOUNTS_URL: &str = "https://accounts.spotify.com/api/token";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of attempts for a request.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_RETRY_DELAY_MS: u64 = 500;

/// Spotify Web API client bound to a single access token.
#[derive(Clone)]
pub struct SpotifyClient {
    /// HTTP client for making requests.
    pub(crate) http: reqwest::Client,
    /// Token sent as the bearer credential.
    token: AccessToken,
    /// Web API root, without trailing slash.
    base_url: String,
    /// Token endpoint used for refreshes.
    pub(crate) accounts_url: String,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("base_url", &self.base_url)
            .field("token_expires_at", &self.token.expires_at)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a client for `token`.
    pub fn new(token: AccessToken) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("Lyra/", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            token,
            base_url: API_BASE_URL.to_string(),
            accounts_url: ACCOUNTS_URL.to_string(),
        })
    }

    /// Point the client at another API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point token refreshes at another endpoint.
    pub fn with_accounts_url(mut self, accounts_url: impl Into<String>) -> Self {
        self.accounts_url = accounts_url.into();
        self
    }

    /// A client sharing this one's connection pool but using `token`.
    pub fn with_token(&self, token: AccessToken) -> Self {
        Self {
            http: self.http.clone(),
            token,
            base_url: self.base_url.clone(),
            accounts_url: self.accounts_url.clone(),
        }
    }

    /// The token requests are sent with.
    pub const fn token(&self) -> &AccessToken {
        &self.token
    }

    /// GET an endpoint and decode its JSON body. `Ok(None)` means the API
    /// answered 204 No Content.
    pub(crate) async fn get<R>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint_url(path, query)?;
        match self.send(Method::GET, url).await? {
            Some(body) => serde_json::from_slice(&body)
                .map(Some)
                .map_err(|e| Error::Parse(format!("Failed to parse {path} response: {e}"))),
            None => Ok(None),
        }
    }

    /// Send a body-less command (player controls).
    pub(crate) async fn command(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<()> {
        let url = self.endpoint_url(path, query)?;
        self.send(method, url).await.map(|_| ())
    }

    pub(crate) fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Send with retries on transient failures.
    async fn send(&self, method: Method, url: Url) -> Result<Option<Vec<u8>>> {
        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                debug!("Retry attempt {attempt} for {} after {delay:?}", url.path());
            }

            match self.do_request(method.clone(), url.clone()).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!("Request to {} failed (attempt {attempt}): {e}", url.path());

                    // Don't retry non-retryable errors
                    if !e.is_retryable() {
                        return Err(e);
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("Request failed".to_string())))
    }

    async fn do_request(&self, method: Method, url: Url) -> Result<Option<Vec<u8>>> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.token.value);

        // The player endpoints reject PUT/POST without a length.
        if method != Method::GET {
            request = request.header(reqwest::header::CONTENT_LENGTH, "0");
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if let Some(error) = status_error(status, response.headers()) {
            let message = response.text().await.unwrap_or_default();
            return Err(match error {
                Error::Http(HttpError::StatusError { status, .. }) => {
                    Error::Http(HttpError::StatusError { status, message })
                }
                other => other,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))?;

        if body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(body.to_vec()))
        }
    }
}

/// Classify a non-success status. Returns `None` for success codes.
pub(crate) fn status_error(status: StatusCode, headers: &HeaderMap) -> Option<Error> {
    if status.is_success() {
        return None;
    }

    Some(match status {
        StatusCode::UNAUTHORIZED => Error::Http(HttpError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after_secs: headers
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok()),
        },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Error::Network(format!("Upstream unavailable ({status})"))
        }
        _ => Error::Http(HttpError::StatusError {
            status: status.as_u16(),
            message: String::new(),
        }),
    })
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Http(HttpError::Timeout)
    } else if e.is_connect() {
        Error::Http(HttpError::ConnectionFailed(e.to_string()))
    } else {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, TestServer};

    fn client_for(server: &TestServer) -> SpotifyClient {
        SpotifyClient::new(AccessToken::new("test-token"))
            .unwrap()
            .with_base_url(server.url())
    }

    #[test]
    fn test_endpoint_url() {
        let client = SpotifyClient::new(AccessToken::new("t"))
            .unwrap()
            .with_base_url("http://localhost:1234/v1/");
        let url = client
            .endpoint_url("/search", &[("q", "a b&c".to_string()), ("limit", "1".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:1234/v1/search?q=a+b%26c&limit=1");
    }

    #[test]
    fn test_status_error_mapping() {
        let headers = HeaderMap::new();
        assert!(status_error(StatusCode::OK, &headers).is_none());
        assert!(status_error(StatusCode::UNAUTHORIZED, &headers)
            .unwrap()
            .is_unauthorized());
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, &headers)
            .unwrap()
            .is_retryable());

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, HeaderValue::from_static("7"));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &headers),
            Some(Error::RateLimited {
                retry_after_secs: Some(7)
            })
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = SpotifyClient::new(AccessToken::new("secret-value")).unwrap();
        assert!(!format!("{client:?}").contains("secret-value"));
    }

    #[tokio::test]
    async fn test_bearer_token_and_no_content() {
        let server = TestServer::start(vec![Reply::status(204)]).await;
        let client = client_for(&server);

        let body: Option<serde_json::Value> = client.get("me/player", &[]).await.unwrap();
        assert!(body.is_none());

        let requests = server.requests();
        assert!(requests[0].starts_with("GET /me/player "));
        assert!(requests[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer test-token"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = TestServer::start(vec![Reply::status(401), Reply::status(204)]).await;
        let client = client_for(&server);

        let err = client
            .get::<serde_json::Value>("me/player", &[])
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let server = TestServer::start(vec![
            Reply::status(503),
            Reply::json(200, r#"{"ok":true}"#),
        ])
        .await;
        let client = client_for(&server);

        let body: Option<serde_json::Value> = client.get("me", &[]).await.unwrap();
        assert_eq!(body.unwrap()["ok"], true);
        assert_eq!(server.requests().len(), 2);
    }
}
