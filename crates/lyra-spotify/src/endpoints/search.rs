//! Search endpoint implementation.

use lyra_core::{Error, Result, TrackSummary};
use tracing::debug;

use crate::types::{RawItem, RawSearchResponse};
use crate::SpotifyClient;

impl SpotifyClient {
    /// Search for tracks, best match first.
    ///
    /// # Arguments
    /// * `query` - Free-text query ("artist title" works well)
    /// * `limit` - Maximum number of results (1-50)
    pub async fn search_tracks(&self, query: &str, limit: u8) -> Result<Vec<TrackSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidArgument("Search query is empty".to_string()));
        }

        let response: Option<RawSearchResponse> = self
            .get(
                "search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.clamp(1, 50).to_string()),
                ],
            )
            .await?;

        let Some(page) = response.and_then(|r| r.tracks) else {
            debug!("Search '{query}' returned no track page");
            return Ok(Vec::new());
        };
        let total = page.total;
        let tracks: Vec<_> = page
            .items
            .into_iter()
            .filter_map(RawItem::into_track)
            .collect();

        debug!("Search '{query}' returned {} of {total} tracks", tracks.len());
        Ok(tracks)
    }

    /// Find the single best track for `query`.
    pub async fn search_track(&self, query: &str) -> Result<Option<TrackSummary>> {
        Ok(self.search_tracks(query, 1).await?.into_iter().next())
    }
}
