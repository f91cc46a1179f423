//! Response envelope and shared handler helpers.

use crate::error::ApiResult;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use serde::Serialize;
use songbook_core::SongPayload;
use songbook_metadata::{RecentlyPlayedRow, SongItemRow};
use time::OffsetDateTime;

/// Largest add-song body accepted; larger bodies get a 413.
pub const MAX_SONG_BODY_SIZE: usize = 1024 * 1024;

/// Envelope wrapped around every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub code: u16,
    pub msg: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            code: StatusCode::OK.as_u16(),
            msg: "success".to_string(),
        }
    }

    /// A successful write, reported with `data: null`.
    pub fn done(msg: impl Into<String>) -> Self {
        Self {
            data: None,
            code: StatusCode::OK.as_u16(),
            msg: msg.into(),
        }
    }

    pub fn error(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            data: None,
            code: status.as_u16(),
            msg: msg.into(),
        }
    }
}

/// A song as returned to clients. `id` is the song id, not the row key.
#[derive(Debug, Clone, Serialize)]
pub struct SongResponse {
    pub id: i64,
    pub title: String,
    pub singer: Option<String>,
    pub singer_id: Option<String>,
    pub mark: Option<String>,
    pub label: Option<String>,
    pub src: String,
    pub index: Option<i64>,
    pub lyric: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub update_time: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
}

impl From<RecentlyPlayedRow> for SongResponse {
    fn from(row: RecentlyPlayedRow) -> Self {
        Self {
            id: row.song_id,
            title: row.title,
            singer: row.singer,
            singer_id: row.singer_id,
            mark: row.mark,
            label: row.label,
            src: row.src,
            index: row.index,
            lyric: row.lyric,
            update_time: row.update_time,
            is_deleted: None,
            list_id: None,
        }
    }
}

impl From<SongItemRow> for SongResponse {
    fn from(row: SongItemRow) -> Self {
        Self {
            id: row.song_id,
            title: row.title,
            singer: row.singer,
            singer_id: row.singer_id,
            mark: row.mark,
            label: row.label,
            src: row.src,
            index: row.index,
            lyric: row.lyric,
            update_time: row.update_time,
            is_deleted: Some(row.is_deleted),
            list_id: Some(row.list_id),
        }
    }
}

/// Decode an add-song request body buffered under `MAX_SONG_BODY_SIZE`.
pub fn decode_song_body(body: Result<Bytes, BytesRejection>) -> ApiResult<SongPayload> {
    let bytes = body?;
    Ok(SongPayload::from_json(&bytes)?)
}
