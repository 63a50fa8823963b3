//! Database access for louvor-mt
//!
//! One SQLite connection backs the whole service, so repository operations
//! are applied one at a time in arrival order.

pub mod codec;
pub mod members;
pub mod songs;

pub use members::DbMembership;
pub use songs::SongRepository;

use louvor_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if needed) the service database and its tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with tables created; used by tests and tooling
pub async fn init_memory_pool() -> Result<SqlitePool> {
    // A second connection to :memory: would see a different, empty database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create songs and ministry_members tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT,
            album TEXT,
            original_key TEXT,
            bpm INTEGER,
            duration TEXT,
            genre TEXT,
            difficulty TEXT,
            lyrics TEXT,
            notes TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            instruments TEXT NOT NULL DEFAULT '[]',
            links TEXT NOT NULL DEFAULT '{}',
            multitrack TEXT NOT NULL DEFAULT 'null',
            ministry_id TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            times_played INTEGER NOT NULL DEFAULT 0,
            last_played TEXT,
            rating REAL,
            rating_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_created_at ON songs (created_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_ministry ON songs (ministry_id)")
        .execute(pool)
        .await?;

    // Populated by the membership service; read-only here
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ministry_members (
            ministry_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            PRIMARY KEY (ministry_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (songs, ministry_members)");

    Ok(())
}
