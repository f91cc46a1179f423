//! Song list repository trait.

use crate::error::MetadataResult;
use crate::models::{SongItemRow, UpsertOutcome};
use async_trait::async_trait;
use songbook_core::{ListId, ListSelector, NewSong, SongId};
use time::OffsetDateTime;

/// Repository for song list membership, keyed by `(song_id, list_id)`.
#[async_trait]
pub trait SongListRepo: Send + Sync {
    /// The most recently touched active membership of a song, in any list.
    async fn get_song_item(&self, song_id: SongId) -> MetadataResult<Option<SongItemRow>>;

    /// The membership row for a pair regardless of its deletion state.
    async fn find_song_item(
        &self,
        song_id: SongId,
        list_id: ListId,
    ) -> MetadataResult<Option<SongItemRow>>;

    /// Active memberships of one list (or of every list), newest first.
    async fn list_song_items(
        &self,
        selector: ListSelector,
        limit: u32,
    ) -> MetadataResult<Vec<SongItemRow>>;

    /// Add `song` to `list_id`, with the same refresh/restore/create rules as
    /// the play history.
    async fn upsert_song_item(
        &self,
        list_id: ListId,
        song: &NewSong,
        now: OffsetDateTime,
    ) -> MetadataResult<UpsertOutcome>;

    /// Soft-delete the active membership of a song in a list.
    ///
    /// Returns `MetadataError::NotFound` when the pair has no active row.
    async fn soft_delete_song_item(
        &self,
        song_id: SongId,
        list_id: ListId,
        now: OffsetDateTime,
    ) -> MetadataResult<()>;
}
