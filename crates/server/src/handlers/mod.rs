//! HTTP request handlers.

pub mod common;
pub mod health;
pub mod recently_played;
pub mod song_list;

pub use common::{ApiResponse, SongResponse};
pub use health::*;
pub use recently_played::*;
pub use song_list::*;
