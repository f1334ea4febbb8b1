//! # lyra-spotify
//!
//! Spotify Web API client for Lyra.
//!
//! The client is an explicit value holding one access token. Refreshing a
//! token returns a new [`TokenSet`]; build a client for it with
//! [`SpotifyClient::with_token`].

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod types;

pub use auth::{AccessToken, Credentials, TokenSet};
pub use client::SpotifyClient;

#[cfg(any(test, feature = "test-util"))]
pub mod test_server;
