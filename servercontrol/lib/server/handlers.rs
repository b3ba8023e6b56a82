//! HTTP request handlers for the REST API.
//!
//! Handlers delegate to the orchestrator and translate its errors into status codes that keep
//! capacity exhaustion, port conflicts and runtime outages apart.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{
    state::ServerState,
    types::{
        ActionResponse, CreateServerRequest, CreateServerResponse, ErrorResponse, HealthResponse,
        LogsResponse,
    },
};
use crate::{
    settings::{Settings, SettingsUpdate},
    RuntimeError, ServerControlError, ServerControlResult,
};

//-------------------------------------------------------------------------------------------------
// Functions: Handlers
//-------------------------------------------------------------------------------------------------

/// Handler for `GET /health`.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Handler for `GET /api/servers`.
pub async fn list_handler(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    match state.orchestrator().list_instances(host).await {
        Ok(instances) => (StatusCode::OK, Json(instances)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler for `POST /api/servers`.
pub async fn create_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateServerRequest>,
) -> Response {
    match state
        .orchestrator()
        .provision(req.into_provision_request())
        .await
    {
        Ok(server) => (
            StatusCode::OK,
            Json(CreateServerResponse {
                success: true,
                message: "Server created and started".to_string(),
                server,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler for `POST /api/servers/{id}/start`.
pub async fn start_handler(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    action_response(state.orchestrator().start(&id).await, "Server started")
}

/// Handler for `POST /api/servers/{id}/stop`.
pub async fn stop_handler(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    action_response(state.orchestrator().stop(&id).await, "Server stopped")
}

/// Handler for `DELETE /api/servers/{id}`.
pub async fn delete_handler(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    action_response(state.orchestrator().delete(&id).await, "Server deleted")
}

/// Handler for `GET /api/servers/{id}/logs`.
pub async fn logs_handler(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.orchestrator().logs(&id).await {
        Ok(logs) => (StatusCode::OK, Json(LogsResponse { logs })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler for `GET /api/servers/{id}/settings`.
pub async fn get_settings_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.orchestrator().settings_store().read(&id).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Handler for `PUT /api/servers/{id}/settings`.
///
/// The body is a partial update merged over the stored settings before the full write.
pub async fn put_settings_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> Response {
    match handle_put_settings(&state, &id, update).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => error_response(e),
    }
}

//-------------------------------------------------------------------------------------------------
// Functions: Helpers
//-------------------------------------------------------------------------------------------------

async fn handle_put_settings(
    state: &ServerState,
    id: &str,
    update: SettingsUpdate,
) -> ServerControlResult<Settings> {
    let store = state.orchestrator().settings_store();
    let merged = update.merge_into(store.read(id).await?);
    merged.validate()?;
    store.write(id, &merged).await?;
    Ok(merged)
}

fn action_response(result: ServerControlResult<()>, message: &str) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(ActionResponse::ok(message))).into_response(),
        Err(e) => error_response(e),
    }
}

/// The status code an error is reported with.
pub fn status_code_for(error: &ServerControlError) -> StatusCode {
    match error {
        ServerControlError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ServerControlError::NoCapacity { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ServerControlError::PortConflict { .. } => StatusCode::CONFLICT,
        ServerControlError::ImageUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => match error.runtime_source() {
            Some(RuntimeError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(RuntimeError::NotModified(_) | RuntimeError::Conflict(_)) => StatusCode::CONFLICT,
            Some(RuntimeError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn error_response(error: ServerControlError) -> Response {
    let status = status_code_for(&error);
    if status.is_server_error() {
        tracing::error!("request failed: {error}");
    } else {
        tracing::debug!("request rejected: {error}");
    }

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            kind: error.kind(),
        }),
    )
        .into_response()
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------
