//! Route definitions for the wars domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::wars;
use super::middleware::WarsState;

/// Create all wars domain API routes
pub fn routes() -> Router<WarsState> {
    Router::new()
        .route("/v1/events/{event_id}/wars", post(wars::create_war))
        .route("/v1/wars/{id}/join", post(wars::join_war))
        .route("/v1/wars/{id}/leave", post(wars::leave_war))
        .route("/v1/wars/{id}/start", post(wars::start_war))
        .route("/v1/wars/{id}/checkpoint", post(wars::checkpoint))
        .route("/v1/wars/{id}/finish", post(wars::finish_war))
        .route("/v1/wars/{id}/scoreboard", get(wars::scoreboard))
}
