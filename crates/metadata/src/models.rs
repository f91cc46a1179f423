//! Database models mapping to the song schema.

use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Recently played
// =============================================================================

/// One entry of the global play history.
#[derive(Debug, Clone, FromRow)]
pub struct RecentlyPlayedRow {
    /// Surrogate key, never exposed.
    pub id: i64,
    pub song_id: i64,
    pub title: String,
    pub singer: Option<String>,
    pub singer_id: Option<String>,
    pub mark: Option<String>,
    pub label: Option<String>,
    pub src: String,
    pub index: Option<i64>,
    pub lyric: Option<String>,
    pub update_time: OffsetDateTime,
    pub is_deleted: bool,
}

// =============================================================================
// Song lists
// =============================================================================

/// Membership of a song in one song list.
#[derive(Debug, Clone, FromRow)]
pub struct SongItemRow {
    /// Surrogate key, never exposed.
    pub id: i64,
    pub song_id: i64,
    pub title: String,
    pub singer: Option<String>,
    pub singer_id: Option<String>,
    pub mark: Option<String>,
    pub label: Option<String>,
    pub src: String,
    pub index: Option<i64>,
    pub lyric: Option<String>,
    pub update_time: OffsetDateTime,
    pub is_deleted: bool,
    pub list_id: i64,
}

// =============================================================================
// Upsert results
// =============================================================================

/// What an upsert did to the row holding the song's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed; a new one was inserted from the payload.
    Created,
    /// An active row existed; only its timestamp moved.
    Refreshed,
    /// A soft-deleted row existed and is active again.
    Restored,
}

impl UpsertOutcome {
    /// Classify from the `is_deleted` flag of the row found before writing.
    pub fn from_prior(prior_is_deleted: Option<bool>) -> Self {
        match prior_is_deleted {
            None => Self::Created,
            Some(false) => Self::Refreshed,
            Some(true) => Self::Restored,
        }
    }

    /// Classify from what the write reported. `inserted` wins over `prior`:
    /// when a concurrent transaction inserted the row between the read and the
    /// write, the read saw nothing but the write only refreshed.
    pub fn from_write(inserted: bool, prior_is_deleted: Option<bool>) -> Self {
        match (inserted, prior_is_deleted) {
            (true, _) => Self::Created,
            (false, Some(true)) => Self::Restored,
            (false, _) => Self::Refreshed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Refreshed => "refreshed",
            Self::Restored => "restored",
        }
    }
}
