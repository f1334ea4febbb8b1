//! Web API endpoint implementations.

pub mod player;
pub mod search;
pub mod tracks;
