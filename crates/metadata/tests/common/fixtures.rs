//! Test fixtures for generating songs and timestamps.

use songbook_core::{NewSong, SongId};
use time::OffsetDateTime;
use time::macros::datetime;

/// A fixed point in time; tests offset from it to control ordering.
#[allow(dead_code)]
pub fn base_time() -> OffsetDateTime {
    datetime!(2024-05-01 12:00:00 UTC)
}

/// `base_time()` plus the given number of seconds.
#[allow(dead_code)]
pub fn at(secs: i64) -> OffsetDateTime {
    base_time() + time::Duration::seconds(secs)
}

/// A valid song with predictable field values.
#[allow(dead_code)]
pub fn test_song(id: i64) -> NewSong {
    NewSong {
        song_id: SongId(id),
        title: format!("Song {id}"),
        singer: format!("Singer {id}"),
        singer_id: Some(format!("singer-{id}")),
        mark: None,
        label: Some("pop".to_string()),
        src: format!("https://music.example.com/{id}.mp3"),
        index: Some(id),
        lyric: None,
    }
}
