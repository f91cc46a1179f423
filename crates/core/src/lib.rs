//! Core domain types and shared logic for the songbook backend.
//!
//! This crate defines the data model used across all other crates:
//! - Song and song-list identities
//! - Add-song payload decoding and validation
//! - Query parameter parsing
//! - Application configuration

pub mod config;
pub mod error;
pub mod song;

pub use error::{Error, Result};
pub use song::{ListId, ListSelector, NewSong, SongId, SongPayload, parse_list_id, parse_song_id};

/// Default number of songs returned by a listing.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Upper bound for the configurable listing limit.
pub const MAX_LIST_LIMIT: u32 = 500;
