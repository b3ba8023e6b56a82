//! Request and response bodies of the REST API.

use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_MAX_PLAYERS,
    orchestration::{ProvisionRequest, ProvisionedInstance},
};

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// Request body for `POST /api/servers`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateServerRequest {
    /// Display name of the game server. Required.
    pub server_name: Option<String>,
    /// Join password.
    pub server_password: Option<String>,
    /// Player cap.
    pub max_players: Option<u32>,
    /// Free-form description.
    pub description: Option<String>,
    /// Retry with another port if the allocated one is taken.
    pub retry_on_conflict: bool,
}

/// Response body for `POST /api/servers`.
#[derive(Debug, Serialize)]
pub struct CreateServerResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// The new instance.
    pub server: ProvisionedInstance,
}

/// Response body for start, stop and delete.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Response body for `GET /api/servers/{id}/logs`.
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    /// The most recent output.
    pub logs: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Machine-readable error kind.
    pub kind: &'static str,
}

//-------------------------------------------------------------------------------------------------
// Methods
//-------------------------------------------------------------------------------------------------

impl CreateServerRequest {
    /// Converts the body into a provisioning request. Validation happens in the orchestrator.
    pub fn into_provision_request(self) -> ProvisionRequest {
        ProvisionRequest::builder()
            .server_name(self.server_name.unwrap_or_default())
            .server_password(self.server_password.unwrap_or_default())
            .max_players(self.max_players.unwrap_or(DEFAULT_MAX_PLAYERS))
            .description(self.description.unwrap_or_default())
            .retry_on_conflict(self.retry_on_conflict)
            .build()
    }
}

impl ActionResponse {
    /// A successful action with `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
