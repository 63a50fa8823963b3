//! louvor-mt - Multitrack ingestion and song repository service
//!
//! Accepts archives of instrument stems, stores the classified stems under
//! the root folder and keeps song records (with their multitrack descriptor)
//! in SQLite.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use louvor_common::config::{self, CompiledDefaults, LoggingConfig, RootFolderInitializer, RootFolderResolver};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use louvor_mt::{
    db::{self, DbMembership, SongRepository},
    services::MultitrackIngestor,
    AppState,
};

/// Command-line arguments for louvor-mt
#[derive(Parser, Debug)]
#[command(name = "louvor-mt")]
#[command(about = "Multitrack ingestion and song repository service for Louvor")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "LOUVOR_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and stored stems
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Explicit config file path
    #[arg(short, long, env = "LOUVOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::load_or_default(args.config.as_deref());
    init_tracing(&toml_config.logging)?;

    let defaults = CompiledDefaults::for_current_platform();
    let port = args.port.or(toml_config.port).unwrap_or(defaults.port);

    info!("Starting louvor-mt (Multitrack) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Root folder: CLI, env, TOML, compiled default
    let root_folder = RootFolderResolver::new("louvor-mt")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let ingestor = MultitrackIngestor::new(
        initializer.multitrack_storage_path(),
        initializer.scratch_path(),
        &toml_config.multitrack,
    );
    info!(
        storage = %initializer.multitrack_storage_path().display(),
        retention_hours = toml_config.multitrack.retention_hours,
        max_archive_bytes = toml_config.multitrack.max_archive_bytes,
        max_unpacked_bytes = toml_config.multitrack.max_unpacked_bytes,
        "Multitrack storage ready"
    );

    let state = AppState::new(
        SongRepository::new(pool.clone()),
        ingestor,
        Arc::new(DbMembership::new(pool)),
    );
    let app = louvor_mt::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins; otherwise the configured level. Optional file output.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "louvor_mt={level},louvor_common={level},tower_http=info",
            level = logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
