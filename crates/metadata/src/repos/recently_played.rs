//! Recently played repository trait.

use crate::error::MetadataResult;
use crate::models::{RecentlyPlayedRow, UpsertOutcome};
use async_trait::async_trait;
use songbook_core::{NewSong, SongId};
use time::OffsetDateTime;

/// Repository for the global play history.
///
/// Identity is the song id alone. The table holds at most one row per song,
/// which is active or soft-deleted.
#[async_trait]
pub trait RecentlyPlayedRepo: Send + Sync {
    /// Active entries, most recently touched first, at most `limit`.
    async fn list_recently_played(&self, limit: u32) -> MetadataResult<Vec<RecentlyPlayedRow>>;

    /// The row for a song regardless of its deletion state.
    async fn get_recently_played(&self, song_id: SongId)
    -> MetadataResult<Option<RecentlyPlayedRow>>;

    /// Record a play of `song`.
    ///
    /// An active row only gets its timestamp refreshed, a soft-deleted row is
    /// reactivated, otherwise a new row is created from the payload. Fields
    /// other than the timestamp are never rewritten after creation.
    async fn upsert_recently_played(
        &self,
        song: &NewSong,
        now: OffsetDateTime,
    ) -> MetadataResult<UpsertOutcome>;

    /// Soft-delete the active row for a song.
    ///
    /// Returns `MetadataError::NotFound` when no active row exists.
    async fn soft_delete_recently_played(
        &self,
        song_id: SongId,
        now: OffsetDateTime,
    ) -> MetadataResult<()>;
}
