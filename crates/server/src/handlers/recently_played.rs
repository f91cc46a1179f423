//! Recently played endpoints.

use crate::error::ApiResult;
use crate::handlers::common::{ApiResponse, SongResponse, decode_song_body};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::Deserialize;
use songbook_core::parse_song_id;
use time::OffsetDateTime;

const STORE: &str = "recently_played";

#[derive(Debug, Deserialize)]
pub struct DeleteRecentParams {
    pub id: Option<String>,
}

/// GET /recently_played/getSong - Newest active entries first.
pub async fn list_recently_played(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<SongResponse>>>> {
    let rows = state
        .metadata
        .list_recently_played(state.list_limit())
        .await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(SongResponse::from).collect(),
    )))
}

/// POST /recently_played/addSong
pub async fn add_recently_played(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let song = decode_song_body(body)?.into_new_song()?;

    let outcome = state
        .metadata
        .upsert_recently_played(&song, OffsetDateTime::now_utc())
        .await?;
    metrics::record_upsert(STORE, outcome);

    tracing::info!(
        song_id = %song.song_id,
        outcome = outcome.as_str(),
        "Recently played updated"
    );

    Ok(Json(ApiResponse::done("Recently played updated successfully")))
}

/// GET /recently_played/deleteSong?id=
pub async fn delete_recently_played(
    State(state): State<AppState>,
    query: Result<Query<DeleteRecentParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Query(params) = query?;
    let song_id = parse_song_id(params.id.as_deref())?;

    state
        .metadata
        .soft_delete_recently_played(song_id, OffsetDateTime::now_utc())
        .await?;
    metrics::record_soft_delete(STORE);

    tracing::info!(song_id = %song_id, "Recently played song deleted");

    Ok(Json(ApiResponse::done("Song deleted successfully")))
}
