mod common;

use std::sync::Arc;

use common::{harness_with_range, orchestrator_over, Harness, PUBLIC_ADDRESS};
use reqwest::StatusCode;
use serde_json::{json, Value};
use servercontrol::{
    config::PortRange,
    server::{create_router, ServerState},
};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Serves the API over a new harness on an ephemeral port and returns its base URL.
async fn spawn_server(range: PortRange) -> anyhow::Result<(String, Harness)> {
    let h = harness_with_range(range)?;
    let orchestrator = Arc::new(orchestrator_over(h.runtime.clone(), &h.home, range));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(ServerState::new(orchestrator));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("http://{addr}"), h))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_server_health() -> anyhow::Result<()> {
    let (base, _h) = spawn_server(PortRange::default()).await?;

    let body: Value = reqwest::get(format!("{base}/health")).await?.json().await?;
    assert_eq!(body, json!({ "status": "ok" }));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_server_instance_lifecycle() -> anyhow::Result<()> {
    let (base, _h) = spawn_server(PortRange::default()).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/servers"))
        .json(&json!({ "serverName": "Island", "maxPlayers": 16 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["server"]["port"], 8211);
    let id = body["server"]["id"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_default();
    assert_eq!(id.len(), 12);

    let listed: Value = client
        .get(format!("{base}/api/servers"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(listed[0]["publicIP"], PUBLIC_ADDRESS);

    let response = client
        .post(format!("{base}/api/servers/{id}/stop"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Stopping again is a conflict with the instance's state
    let response = client
        .post(format!("{base}/api/servers/{id}/stop"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(body["kind"], "stop_error");

    let response = client
        .post(format!("{base}/api/servers/{id}/start"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{base}/api/servers/{id}/logs"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(format!("{base}/api/servers/{id}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(format!("{base}/api/servers/{id}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_server_rejects_missing_name() -> anyhow::Result<()> {
    let (base, h) = spawn_server(PortRange::default()).await?;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/servers"))
        .json(&json!({ "serverPassword": "hunter2" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert_eq!(body["kind"], "invalid_argument");
    assert_eq!(h.runtime.sandbox_count(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_server_capacity_and_registry_errors() -> anyhow::Result<()> {
    let (base, h) = spawn_server(PortRange::new(8211, 8211)).await?;

    let client = reqwest::Client::new();
    let create = || {
        client
            .post(format!("{base}/api/servers"))
            .json(&json!({ "serverName": "Island" }))
            .send()
    };

    assert_eq!(create().await?.status(), StatusCode::OK);

    let response = create().await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await?;
    assert_eq!(body["kind"], "no_capacity");

    h.runtime.set_registry_reachable(false);
    assert_eq!(create().await?.status(), StatusCode::BAD_GATEWAY);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_server_settings_round_trip() -> anyhow::Result<()> {
    let (base, _h) = spawn_server(PortRange::default()).await?;
    let client = reqwest::Client::new();

    // Unknown ids read as defaults
    let settings: Value = client
        .get(format!("{base}/api/servers/0123456789ab/settings"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(settings["serverName"], "Unnamed Server");
    assert_eq!(settings["maxPlayers"], 32);

    let response = client
        .put(format!("{base}/api/servers/0123456789ab/settings"))
        .json(&json!({ "pvp": true, "difficulty": "Hard" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let settings: Value = client
        .get(format!("{base}/api/servers/0123456789ab/settings"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(settings["pvp"], true);
    assert_eq!(settings["difficulty"], "Hard");
    assert_eq!(settings["serverName"], "Unnamed Server");

    let response = client
        .put(format!("{base}/api/servers/0123456789ab/settings"))
        .json(&json!({ "maxPlayers": 0 }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{base}/api/servers/bad.id/settings"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_server_does_not_delete_unmanaged_containers() -> anyhow::Result<()> {
    let (base, h) = spawn_server(PortRange::default()).await?;
    h.run_foreign_sandbox("postgres", 5432).await?;

    let response = reqwest::Client::new()
        .delete(format!("{base}/api/servers/postgres"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await?;
    assert_eq!(body["kind"], "delete_error");
    assert_eq!(h.runtime.sandbox_count(), 1);
    Ok(())
}
