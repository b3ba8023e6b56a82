//! The REST API for managing game-server instances.
//!
//! - `GET /health`
//! - `GET /api/servers`, `POST /api/servers`
//! - `POST /api/servers/{id}/start`, `POST /api/servers/{id}/stop`, `DELETE /api/servers/{id}`
//! - `GET /api/servers/{id}/logs`
//! - `GET /api/servers/{id}/settings`, `PUT /api/servers/{id}/settings`

mod handlers;
mod routes;
mod state;
mod types;

use std::sync::Arc;

use crate::{orchestration::Orchestrator, ServerControlResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use handlers::status_code_for;
pub use routes::create_router;
pub use state::ServerState;
pub use types::*;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Serves the API on `addr` until Ctrl-C is received.
pub async fn serve(orchestrator: Arc<Orchestrator>, addr: &str) -> ServerControlResult<()> {
    let app = create_router(ServerState::new(orchestrator));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutting down"),
                Err(e) => {
                    tracing::error!("failed to listen for shutdown signal: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}
