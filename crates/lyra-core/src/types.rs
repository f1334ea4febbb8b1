//! Core domain types for Lyra.

pub mod line;
pub mod playback;
pub mod song;
pub mod track;

pub use line::{is_sorted_by_time, sort_by_time, LyricLine, LyricSequence};
pub use playback::{PlaybackState, RepeatMode};
pub use song::{SongLyrics, SongSummary};
pub use track::{TrackArtist, TrackSummary};
