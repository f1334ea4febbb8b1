//! Commands that talk to the store and the streaming service.

pub mod follow;
pub mod library;
pub mod player;
pub mod session;

pub use follow::run_follow;
pub use session::SpotifySession;
