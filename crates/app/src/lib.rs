//! Writeclub application composition root
//!
//! Composes all domain routers into a single application.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use writeclub_events::PgEventDirectory;
use writeclub_projects::PgProjectDirectory;
use writeclub_wars::{PgWarStore, WarService, WarsState};

/// Create the main application router with all routes and middleware
pub fn create_app(pool: PgPool) -> Router {
    // Wire the wars domain against the Postgres store and gates
    let wars = WarService::new(
        Arc::new(PgWarStore::new(pool.clone())),
        Arc::new(PgEventDirectory::new(pool.clone())),
        Arc::new(PgProjectDirectory::new(pool)),
    );
    let wars_state = WarsState { wars };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/", axum::routing::get(|| async { "Writeclub API v0.1.0" }))
        .merge(writeclub_wars::routes().with_state(wars_state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
