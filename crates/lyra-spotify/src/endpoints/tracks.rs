//! Track lookup.

use lyra_core::{Error, Result, TrackSummary};

use crate::types::RawItem;
use crate::SpotifyClient;

impl SpotifyClient {
    /// Look up a track by ID. Returns `None` for unknown IDs.
    pub async fn get_track(&self, id: &str) -> Result<Option<TrackSummary>> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidArgument(format!("Invalid track ID '{id}'")));
        }

        match self.get::<RawItem>(&format!("tracks/{id}"), &[]).await {
            Ok(item) => Ok(item.and_then(RawItem::into_track)),
            Err(Error::Http(lyra_core::HttpError::StatusError { status: 404 | 400, .. })) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::test_server::{Reply, TestServer};
    use crate::{AccessToken, SpotifyClient};

    #[tokio::test]
    async fn test_get_track() {
        let server = TestServer::start(vec![
            Reply::json(
                200,
                r#"{"id": "abc123", "name": "Song", "type": "track", "duration_ms": 1234,
                    "artists": [{"name": "Artist"}], "album": {"name": "Album"}}"#,
            ),
            Reply::json(404, r#"{"error": {"status": 404, "message": "Not found"}}"#),
        ])
        .await;
        let client = SpotifyClient::new(AccessToken::new("t"))
            .unwrap()
            .with_base_url(server.url());

        let track = client.get_track("abc123").await.unwrap().unwrap();
        assert_eq!(track.name, "Song");
        assert_eq!(track.duration_ms, 1234);

        assert!(client.get_track("missing").await.unwrap().is_none());
        assert!(server.requests()[0].starts_with("GET /tracks/abc123 "));
    }

    #[tokio::test]
    async fn test_rejects_path_characters() {
        let client = SpotifyClient::new(AccessToken::new("t")).unwrap();
        assert!(client.get_track("../me").await.is_err());
    }
}
