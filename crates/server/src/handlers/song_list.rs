//! Song list endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{ApiResponse, SongResponse, decode_song_body};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use songbook_core::{ListSelector, parse_list_id, parse_song_id};
use time::OffsetDateTime;

const STORE: &str = "song_list";

#[derive(Debug, Deserialize)]
pub struct GetSongParams {
    pub id: Option<String>,
    pub list_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSongParams {
    pub id: Option<String>,
    pub list_id: Option<String>,
}

/// GET /song_list/getSong
///
/// With `id`, returns that song's most recently touched active membership.
/// Otherwise lists `list_id` (a list id or `all`), newest first.
pub async fn get_song(
    State(state): State<AppState>,
    query: Result<Query<GetSongParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = query?;
    if let Some(raw_id) = params.id.as_deref() {
        let song_id = parse_song_id(Some(raw_id))?;
        let row = state
            .metadata
            .get_song_item(song_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("song {song_id} is not in any list")))?;
        return Ok(Json(ApiResponse::success(SongResponse::from(row))).into_response());
    }

    let selector = ListSelector::parse(params.list_id.as_deref())?;
    let rows = state
        .metadata
        .list_song_items(selector, state.list_limit())
        .await?;

    tracing::debug!(list = %selector, count = rows.len(), "Listed song list entries");

    let songs: Vec<SongResponse> = rows.into_iter().map(SongResponse::from).collect();
    Ok(Json(ApiResponse::success(songs)).into_response())
}

/// POST /song_list/addSong
pub async fn add_song(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let (list_id, song) = decode_song_body(body)?.into_list_entry()?;

    let outcome = state
        .metadata
        .upsert_song_item(list_id, &song, OffsetDateTime::now_utc())
        .await?;
    metrics::record_upsert(STORE, outcome);

    tracing::info!(
        song_id = %song.song_id,
        list_id = %list_id,
        outcome = outcome.as_str(),
        "Song list updated"
    );

    Ok(Json(ApiResponse::done("SongItem updated successfully")))
}

/// GET /song_list/deleteSong?id=&list_id=
pub async fn delete_song(
    State(state): State<AppState>,
    query: Result<Query<DeleteSongParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Query(params) = query?;
    let song_id = parse_song_id(params.id.as_deref())?;
    let list_id = parse_list_id(params.list_id.as_deref())?;

    state
        .metadata
        .soft_delete_song_item(song_id, list_id, OffsetDateTime::now_utc())
        .await?;
    metrics::record_soft_delete(STORE);

    tracing::info!(song_id = %song_id, list_id = %list_id, "Song removed from list");

    Ok(Json(ApiResponse::done("Song deleted successfully")))
}
