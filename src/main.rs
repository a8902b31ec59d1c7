//! Hackathon API
//!
//! Backend for a hackathon: teams submit project proposals, admins review
//! them and select up to fifteen finalists, announcements are published to
//! participants, and team logos are uploaded to an image store.
//!
//! Proposals, settings and announcements live in PostgreSQL by default.
//! Set `STORAGE_BACKEND=memory` to run without a database.

mod announcement;
mod auth;
mod config;
mod db;
mod error;
mod images;
mod models;
mod proposal;
mod routes;
mod settings;
mod state;

use crate::config::{Config, StorageBackend};
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Hackathon API...");

    // Load configuration
    let config = Config::load()?;
    info!("📋 Configuration loaded successfully");

    let state = match config.storage_backend() {
        StorageBackend::Postgres => {
            let pool = match db::init_pool(&config.database).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ FATAL: Failed to initialize database pool: {}", e);
                    error!("Set DATABASE_URL (or STORAGE_BACKEND=memory) and make sure the database is reachable");
                    return Err(e);
                }
            };
            info!("✅ Database pool created successfully");

            db::ensure_schema(&pool).await?;
            Arc::new(AppState::with_pool(pool, &config))
        }
        StorageBackend::Memory => {
            warn!("⚠️  Using in-memory storage, data is lost on restart");
            Arc::new(AppState::in_memory(&config))
        }
    };

    tokio::fs::create_dir_all(&config.uploads.dir).await?;
    info!("🖼️  Logos stored under {}", config.uploads.dir.display());

    // Build the router
    let app = create_router(state, &config);

    // Create socket address
    let addr = SocketAddr::from((config.server.host, config.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Teams ───");
    info!("   POST   /api/proposals/submit             - Submit a proposal");
    info!("   GET    /api/proposals/check/:teamName    - Has this team submitted?");
    info!("   GET    /api/teams/selected               - Selected teams");
    info!("   GET    /api/announcements                - Announcements");
    info!("");
    info!("   ─── Admin ───");
    info!("   POST   /api/admin/proposals              - List all proposals");
    info!("   POST   /api/admin/proposals/:id/status   - Set proposal status");
    info!("   POST   /api/admin/toggle-selection/:id   - Toggle selection");
    info!("   POST   /api/admin/select-teams           - Replace the selection (15 ids)");
    info!("   POST   /api/admin/selected-count         - Number of selected teams");
    info!("   POST   /api/admin/announcements          - Publish an announcement");
    info!("   POST   /api/admin/deadline               - Set submission deadline");
    info!("   GET    /api/admin/settings               - Current settings");
    info!("");
    info!("   ─── Uploads ───");
    info!("   POST   /api/upload/logo                  - Upload a team logo");
    info!("   DELETE /api/upload/logo                  - Delete a team logo");
    info!("   GET    /api/upload/logo/*id              - Logo metadata");
    info!("   GET    /api/upload/info                  - Upload limits");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,hackathon_api=debug,tower_http=debug,selection=info")
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .compact(),
            )
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
