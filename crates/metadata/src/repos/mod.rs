//! Repository traits for song persistence.

pub mod recently_played;
pub mod song_lists;

pub use recently_played::RecentlyPlayedRepo;
pub use song_lists::SongListRepo;
