//! Song API handlers
//!
//! GET /songs, GET/PUT/DELETE /songs/:id, POST /songs,
//! POST /songs/:id/restore, POST /songs/:id/play
//!
//! Mutations on a ministry-scoped song require the caller to be a member of
//! that ministry.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::caller_id;
use crate::{
    access,
    error::{ApiError, ApiResult},
    models::{NewSong, SongRecord, SongUpdate},
    AppState,
};

/// GET /songs query
#[derive(Debug, Default, Deserialize)]
pub struct ListSongsQuery {
    pub ministry_id: Option<String>,
}

/// GET /songs
///
/// Newest first. `?ministry_id=` restricts the list to one ministry.
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<ListSongsQuery>,
) -> ApiResult<Json<Vec<SongRecord>>> {
    let songs = match query.ministry_id.as_deref() {
        Some(ministry_id) => state.songs.list_by_ministry(ministry_id).await?,
        None => state.songs.get_all().await?,
    };
    Ok(Json(songs))
}

/// GET /songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SongRecord>> {
    Ok(Json(require_song(&state, &id).await?))
}

/// POST /songs
///
/// 201 with the stored record; 409 if the id is taken.
pub async fn create_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut song): Json<NewSong>,
) -> ApiResult<(StatusCode, Json<SongRecord>)> {
    let user_id = caller_id(&headers);
    access::authorize(state.membership.as_ref(), song.ministry_id.as_deref(), user_id).await?;

    if song.created_by.is_none() {
        song.created_by = user_id.map(str::to_string);
    }

    let record = state.songs.insert(song).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /songs/:id
///
/// Replaces every mutable field. Moving a song to another ministry requires
/// membership in both.
pub async fn update_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<SongUpdate>,
) -> ApiResult<Json<SongRecord>> {
    let user_id = caller_id(&headers);
    let current = require_song(&state, &id).await?;

    access::authorize(state.membership.as_ref(), current.ministry_id.as_deref(), user_id).await?;
    if update.ministry_id != current.ministry_id {
        access::authorize(state.membership.as_ref(), update.ministry_id.as_deref(), user_id).await?;
    }

    if !state.songs.update(&id, &update).await? {
        return Err(ApiError::NotFound(format!("Song not found: {}", id)));
    }

    Ok(Json(require_song(&state, &id).await?))
}

/// DELETE /songs/:id
///
/// Soft delete; the record stays and can be restored.
pub async fn delete_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    set_active(&state, &headers, &id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /songs/:id/restore
pub async fn restore_song(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SongRecord>> {
    set_active(&state, &headers, &id, true).await?;
    Ok(Json(require_song(&state, &id).await?))
}

/// POST /songs/:id/play
pub async fn record_play(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SongRecord>> {
    let current = require_song(&state, &id).await?;
    access::authorize(
        state.membership.as_ref(),
        current.ministry_id.as_deref(),
        caller_id(&headers),
    )
    .await?;

    if !state.songs.record_play(&id, louvor_common::time::now()).await? {
        return Err(ApiError::NotFound(format!("Song not found: {}", id)));
    }

    Ok(Json(require_song(&state, &id).await?))
}

async fn set_active(state: &AppState, headers: &HeaderMap, id: &str, active: bool) -> ApiResult<()> {
    let current = require_song(state, id).await?;
    access::authorize(
        state.membership.as_ref(),
        current.ministry_id.as_deref(),
        caller_id(headers),
    )
    .await?;

    if !state.songs.set_active(id, active).await? {
        return Err(ApiError::NotFound(format!("Song not found: {}", id)));
    }
    Ok(())
}

pub(crate) async fn require_song(state: &AppState, id: &str) -> ApiResult<SongRecord> {
    state
        .songs
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Song not found: {}", id)))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/songs", get(list_songs).post(create_song))
        .route(
            "/songs/:id",
            get(get_song).put(update_song).delete(delete_song),
        )
        .route("/songs/:id/restore", post(restore_song))
        .route("/songs/:id/play", post(record_play))
}
