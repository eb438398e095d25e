//! Parley chat REST API server.
//!
//! Session-authenticated JSON API over the `database` crate: accounts,
//! friends, direct and group messages, polls, and file uploads.

mod config;
mod error;
mod routes;
mod session;
mod state;
mod views;

use database::Database;
use tower_http::services::ServeDir;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Parley API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Make sure the media directory exists before serving it
    tokio::fs::create_dir_all(&config.media_dir).await?;

    // Server-side sessions, expired on inactivity
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_minutes,
        )));

    // Build application state
    let addr = config.addr;
    let media_dir = config.media_dir.clone();
    let state = AppState::new(db.clone(), config);

    // Build router
    let app = routes::router()
        .nest_service("/media", ServeDir::new(media_dir))
        .with_state(state)
        .layer(session_layer);

    // Start server
    info!(addr = %addr, "Parley API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
