//! Multitrack upload handlers
//!
//! POST /songs/:id/multitrack, POST /multitrack/upload
//!
//! The archive part of the multipart body is streamed chunk by chunk into the
//! intake buffer; the rest of the pipeline runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use super::{caller_id, songs::require_song};
use crate::{
    access,
    error::{ApiError, ApiResult},
    models::{MultitrackDescriptor, MultitrackTrack},
    services::{IngestOutcome, MultitrackIngestor, UploadedArchive},
    AppState,
};

/// Multipart field names accepted for the archive
const ARCHIVE_FIELDS: [&str; 2] = ["multitrack", "file"];

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultitrackUploadResponse {
    pub message: String,
    pub tracks: Vec<MultitrackTrack>,
    pub total_tracks: usize,
    /// Full descriptor, for callers that persist it themselves
    pub multitrack: MultitrackDescriptor,
}

impl From<MultitrackDescriptor> for MultitrackUploadResponse {
    fn from(descriptor: MultitrackDescriptor) -> Self {
        let total_tracks = descriptor.total_tracks();
        Self {
            message: format!("Multitrack processed: {} tracks", total_tracks),
            tracks: descriptor.tracks.clone(),
            total_tracks,
            multitrack: descriptor,
        }
    }
}

/// POST /songs/:id/multitrack
///
/// Ingests the archive and attaches the descriptor to the song. The stems
/// are fully stored before the song record is touched.
pub async fn upload_song_multitrack(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<MultitrackUploadResponse>> {
    let song = require_song(&state, &id).await?;
    access::authorize(
        state.membership.as_ref(),
        song.ministry_id.as_deref(),
        caller_id(&headers),
    )
    .await?;

    let outcome = run_ingestion(&state, multipart).await?;

    if !state.songs.attach_multitrack(&id, &outcome.descriptor).await? {
        // Song vanished mid-upload; its stems are left for the sweeper
        tracing::warn!(song_id = %id, directory = %outcome.directory_id, "Song missing after ingestion");
        return Err(ApiError::NotFound(format!("Song not found: {}", id)));
    }

    Ok(Json(outcome.descriptor.into()))
}

/// POST /multitrack/upload
///
/// Ingests the archive and returns the descriptor without storing it.
pub async fn upload_multitrack(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<MultitrackUploadResponse>> {
    let outcome = run_ingestion(&state, multipart).await?;
    Ok(Json(outcome.descriptor.into()))
}

async fn run_ingestion(state: &AppState, multipart: Multipart) -> ApiResult<IngestOutcome> {
    let result = ingest_upload(state.ingestor.clone(), multipart).await;

    if let Err(ref e) = result {
        *state.last_error.write().await = Some(e.to_string());
    }
    result
}

async fn ingest_upload(ingestor: Arc<MultitrackIngestor>, multipart: Multipart) -> ApiResult<IngestOutcome> {
    let sweeper = ingestor.clone();
    tokio::task::spawn_blocking(move || sweeper.sweep_stale())
        .await
        .map_err(|e| ApiError::Internal(format!("Retention sweep task failed: {}", e)))?;

    let archive = receive_archive(&ingestor, multipart).await?;

    tokio::task::spawn_blocking(move || ingestor.ingest(archive))
        .await
        .map_err(|e| ApiError::Internal(format!("Ingestion task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Buffer the first archive part of the form
async fn receive_archive(ingestor: &MultitrackIngestor, mut multipart: Multipart) -> ApiResult<UploadedArchive> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let is_archive = field.name().is_some_and(|n| ARCHIVE_FIELDS.contains(&n));
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !is_archive {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let mut buffer = ingestor.intake().begin(&file_name, content_type.as_deref())?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
        {
            buffer.write_chunk(&chunk)?;
        }

        if buffer.bytes_written() == 0 {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        return Ok(buffer.finish()?);
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// Build multitrack routes
pub fn multitrack_routes(max_upload_bytes: u64) -> Router<AppState> {
    // Room for multipart framing on top of the archive ceiling
    let limit = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/songs/:id/multitrack", post(upload_song_multitrack))
        .route("/multitrack/upload", post(upload_multitrack))
        .layer(DefaultBodyLimit::max(limit))
}
