//! Request bodies used across API tests.

use serde_json::{Value, json};

/// A valid add-song body for `/recently_played/addSong`.
#[allow(dead_code)]
pub fn song_body(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Song {id}"),
        "singer": format!("Singer {id}"),
        "singer_id": format!("singer-{id}"),
        "label": "pop",
        "src": format!("https://music.example.com/{id}.mp3"),
        "index": id,
    })
}

/// A valid add-song body for `/song_list/addSong`.
#[allow(dead_code)]
pub fn list_song_body(id: i64, list_id: i64) -> Value {
    let mut body = song_body(id);
    body["list_id"] = json!(list_id);
    body
}
