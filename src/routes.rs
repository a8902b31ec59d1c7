//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod admin;
mod announcements;
mod proposals;
mod teams;
mod upload;

use crate::config::Config;
use crate::models::MessageResponse;
use crate::state::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Room for multipart boundaries and the text fields next to the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, config: &Config) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(config);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))

        // Public proposal routes
        .route("/api/proposals/submit", post(proposals::submit_proposal))
        .route("/api/proposals/check/{team_name}", get(proposals::check_submitted))
        .route("/api/teams/selected", get(teams::selected_teams))
        .route("/api/announcements", get(announcements::list_announcements))

        // Admin routes
        .route("/api/admin/proposals", post(admin::list_proposals))
        .route("/api/admin/proposals/{id}/status", post(admin::set_status))
        .route("/api/admin/toggle-selection/{id}", post(admin::toggle_selection))
        .route("/api/admin/select-teams", post(admin::select_teams))
        .route("/api/admin/selected-count", post(admin::selected_count))
        .route("/api/admin/announcements", post(admin::create_announcement))
        .route("/api/admin/deadline", post(admin::set_deadline))
        .route("/api/admin/settings", get(admin::get_settings))

        // Logo uploads
        .route("/api/upload/logo", post(upload::upload_logo).delete(upload::delete_logo))
        .route("/api/upload/logo/{*id}", get(upload::logo_metadata))
        .route("/api/upload/info", get(upload::upload_info))
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))

        // Apply middleware and state
        .layer(DefaultBodyLimit::max(config.uploads.max_bytes + MULTIPART_OVERHEAD))
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from config
fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<_> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn banner() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hackathon API"))
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
