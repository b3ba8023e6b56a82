//! Route definitions for the HTTP server.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::{handlers, state::ServerState};

//-------------------------------------------------------------------------------------------------
// Functions
//-------------------------------------------------------------------------------------------------

/// Creates a router with every API endpoint configured.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/servers",
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route("/api/servers/{id}", delete(handlers::delete_handler))
        .route("/api/servers/{id}/start", post(handlers::start_handler))
        .route("/api/servers/{id}/stop", post(handlers::stop_handler))
        .route("/api/servers/{id}/logs", get(handlers::logs_handler))
        .route(
            "/api/servers/{id}/settings",
            get(handlers::get_settings_handler).put(handlers::put_settings_handler),
        )
        .with_state(state)
}
