//! louvor-mt library interface
//!
//! Multitrack stem ingestion and the song repository it feeds. Exposed as a
//! library so integration tests can build the router directly.

pub mod access;
pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::access::MembershipCheck;
use crate::db::SongRepository;
use crate::services::MultitrackIngestor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Song store (one shared connection)
    pub songs: SongRepository,
    /// Multitrack ingestion pipeline
    pub ingestor: Arc<MultitrackIngestor>,
    /// Ministry membership decisions
    pub membership: Arc<dyn MembershipCheck>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        songs: SongRepository,
        ingestor: MultitrackIngestor,
        membership: Arc<dyn MembershipCheck>,
    ) -> Self {
        Self {
            songs,
            ingestor: Arc::new(ingestor),
            membership,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.ingestor.intake().max_bytes();

    Router::new()
        .merge(api::song_routes())
        .merge(api::multitrack_routes(max_upload_bytes))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
