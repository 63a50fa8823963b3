//! App state over an in-memory database and a temp root folder

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use louvor_common::config::{MultitrackSettings, MULTITRACK_DIR, SCRATCH_DIR};
use louvor_mt::access::{MembershipCheck, StaticMembership};
use louvor_mt::db::{self, SongRepository};
use louvor_mt::services::MultitrackIngestor;
use louvor_mt::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const BOUNDARY: &str = "louvor-test-boundary";

pub struct TestApp {
    /// Keeps the root folder alive for the test
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub state: AppState,
}

impl TestApp {
    /// Every membership check passes
    pub async fn new() -> Self {
        Self::with_membership(Arc::new(StaticMembership::allow_all())).await
    }

    pub async fn with_membership(membership: Arc<dyn MembershipCheck>) -> Self {
        Self::build(membership, MultitrackSettings::default()).await
    }

    pub async fn build(membership: Arc<dyn MembershipCheck>, settings: MultitrackSettings) -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::init_memory_pool().await.unwrap();

        let ingestor = MultitrackIngestor::new(
            dir.path().join(MULTITRACK_DIR),
            dir.path().join(SCRATCH_DIR),
            &settings,
        );
        let state = AppState::new(SongRepository::new(pool.clone()), ingestor, membership);

        Self { dir, pool, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn songs(&self) -> &SongRepository {
        &self.state.songs
    }

    pub fn storage_root(&self) -> PathBuf {
        self.dir.path().join(MULTITRACK_DIR)
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.dir.path().join(SCRATCH_DIR)
    }

    /// Entries directly under the stem storage root
    pub fn stored_directories(&self) -> Vec<PathBuf> {
        list(&self.storage_root())
    }

    /// Entries directly under the scratch root
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        list(&self.scratch_root())
    }
}

fn list(dir: &std::path::Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// multipart/form-data body with a single file part
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

/// Collect a response body as JSON
pub async fn read_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
