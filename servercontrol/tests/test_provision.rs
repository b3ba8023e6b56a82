mod common;

use std::{collections::BTreeSet, sync::Arc};

use common::{harness, harness_with_range, orchestrator_over, StaleListRuntime};
use futures::future;
use servercontrol::{
    config::{PortRange, DEFAULT_IMAGE, DEFAULT_MEMORY_LIMIT_BYTES, SANDBOX_DATA_PATH},
    orchestration::ProvisionRequest,
    runtime::SandboxRuntime,
    settings::SettingsStore,
    RuntimeError, ServerControlError,
};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn request(name: &str) -> ProvisionRequest {
    ProvisionRequest::builder().server_name(name).build()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_provision_allocates_lowest_free_port() -> anyhow::Result<()> {
    let h = harness()?;

    let first = h.orchestrator.provision(request("First")).await?;
    let second = h.orchestrator.provision(request("Second")).await?;

    assert_eq!(first.port, 8211);
    assert_eq!(first.query_port, 8211 + 16804);
    assert_eq!(second.port, 8212);
    assert_eq!(first.id.len(), 12);
    assert!(first.sandbox_id.starts_with(&first.id));
    assert!(first.name.starts_with("palworld-server-"));
    assert_ne!(first.name, second.name);

    let running = h.runtime.list(false).await?;
    assert_eq!(running.len(), 2);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_skips_ports_bound_by_unmanaged_sandboxes() -> anyhow::Result<()> {
    let h = harness()?;
    h.run_foreign_sandbox("web", 8211).await?;

    let instance = h.orchestrator.provision(request("Island")).await?;
    assert_eq!(instance.port, 8212);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_skips_ports_whose_query_port_is_bound() -> anyhow::Result<()> {
    let h = harness()?;
    h.run_foreign_sandbox("steam", 25015).await?;

    let first = h.orchestrator.provision(request("First")).await?;
    assert_eq!((first.port, first.query_port), (8212, 25016));

    // Once the query port is released, the lowest game port is usable again
    h.runtime.remove("steam", true).await?;
    let second = h.orchestrator.provision(request("Second")).await?;
    assert_eq!((second.port, second.query_port), (8211, 25015));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_concurrent_requests_get_distinct_ports() -> anyhow::Result<()> {
    let h = harness()?;

    let results = future::join_all(
        ["A", "B", "C"].map(|name| h.orchestrator.provision(request(name))),
    )
    .await;

    let ports = results
        .into_iter()
        .map(|r| r.map(|instance| instance.port))
        .collect::<Result<BTreeSet<_>, _>>()?;
    assert_eq!(ports, BTreeSet::from([8211, 8212, 8213]));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_reports_no_capacity() -> anyhow::Result<()> {
    let h = harness_with_range(PortRange::new(8211, 8212))?;
    h.orchestrator.provision(request("A")).await?;
    h.orchestrator.provision(request("B")).await?;

    let result = h.orchestrator.provision(request("C")).await;
    assert!(matches!(
        result,
        Err(ServerControlError::NoCapacity {
            start: 8211,
            end: 8212
        })
    ));
    assert_eq!(h.runtime.sandbox_count(), 2);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_image_unavailable_leaves_nothing_behind() -> anyhow::Result<()> {
    let h = harness()?;
    h.runtime.set_registry_reachable(false);

    let result = h.orchestrator.provision(request("Island")).await;
    match result {
        Err(ServerControlError::ImageUnavailable { image, source }) => {
            assert_eq!(image, DEFAULT_IMAGE);
            assert!(source.is_unavailable());
        }
        other => panic!("expected ImageUnavailable, got {other:?}"),
    }

    assert_eq!(h.runtime.sandbox_count(), 0);
    assert!(!h.data_dir().exists());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_rejects_invalid_requests() -> anyhow::Result<()> {
    let h = harness()?;

    let result = h.orchestrator.provision(request("  ")).await;
    assert!(matches!(result, Err(ServerControlError::InvalidArgument(_))));

    let result = h
        .orchestrator
        .provision(
            ProvisionRequest::builder()
                .server_name("Island")
                .max_players(64)
                .build(),
        )
        .await;
    assert!(matches!(result, Err(ServerControlError::InvalidArgument(_))));

    assert_eq!(h.runtime.sandbox_count(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_lost_port_race_surfaces_conflict() -> anyhow::Result<()> {
    let range = PortRange::new(8211, 8213);
    let h = harness_with_range(range)?;
    h.orchestrator.provision(request("First")).await?;

    // Both provisioners see only the instance on 8211
    let snapshot = h.runtime.list(true).await?;
    let winner = h.orchestrator.provision(request("Winner")).await?;
    assert_eq!(winner.port, 8212);

    let stale = StaleListRuntime {
        inner: h.runtime.clone(),
        snapshot,
    };
    let loser = orchestrator_over(Arc::new(stale), &h.home, range);

    let result = loser.provision(request("Loser")).await;
    let sandbox_id = match result {
        Err(ServerControlError::PortConflict {
            port: 8212,
            query_port: 25016,
            sandbox_id: Some(sandbox_id),
        }) => sandbox_id,
        other => panic!("expected PortConflict on 8212, got {other:?}"),
    };

    // The created sandbox is left for the caller
    assert_eq!(h.runtime.sandbox_count(), 3);
    h.runtime.remove(&sandbox_id, true).await?;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_retries_on_conflict_when_requested() -> anyhow::Result<()> {
    let range = PortRange::new(8211, 8213);
    let h = harness_with_range(range)?;
    h.orchestrator.provision(request("First")).await?;

    let snapshot = h.runtime.list(true).await?;
    h.orchestrator.provision(request("Winner")).await?;

    let stale = StaleListRuntime {
        inner: h.runtime.clone(),
        snapshot,
    };
    let loser = orchestrator_over(Arc::new(stale), &h.home, range);

    let instance = loser
        .provision(
            ProvisionRequest::builder()
                .server_name("Loser")
                .retry_on_conflict(true)
                .build(),
        )
        .await?;

    assert_eq!(instance.port, 8213);
    assert_eq!(h.runtime.sandbox_count(), 3);
    assert_eq!(h.runtime.list(false).await?.len(), 3);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_retry_gives_up_after_configured_attempts() -> anyhow::Result<()> {
    let h = harness()?;
    h.orchestrator.provision(request("A")).await?;
    h.orchestrator.provision(request("B")).await?;
    h.orchestrator.provision(request("C")).await?;

    let stale = StaleListRuntime {
        inner: h.runtime.clone(),
        snapshot: Vec::new(),
    };
    let loser = orchestrator_over(Arc::new(stale), &h.home, PortRange::default());

    // Three attempts hit 8211, 8212 and 8213 in turn
    let result = loser
        .provision(
            ProvisionRequest::builder()
                .server_name("D")
                .retry_on_conflict(true)
                .build(),
        )
        .await;
    assert!(matches!(
        result,
        Err(ServerControlError::PortConflict { port: 8213, .. })
    ));

    // Only the last conflicting sandbox is left behind
    assert_eq!(h.runtime.sandbox_count(), 4);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_start_failure_keeps_sandbox() -> anyhow::Result<()> {
    let h = harness()?;
    h.runtime.set_start_failure(Some(RuntimeError::Api {
        status: 500,
        message: "oci runtime create failed".to_string(),
    }));

    let result = h.orchestrator.provision(request("Island")).await;
    let sandbox_id = match result {
        Err(ServerControlError::StartAfterCreateFailed { sandbox_id, .. }) => sandbox_id,
        other => panic!("expected StartAfterCreateFailed, got {other:?}"),
    };

    assert_eq!(h.runtime.sandbox_count(), 1);
    h.runtime.set_start_failure(None);
    h.orchestrator.delete(&sandbox_id).await?;
    assert_eq!(h.runtime.sandbox_count(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_sandbox_spec() -> anyhow::Result<()> {
    let h = harness()?;
    let instance = h
        .orchestrator
        .provision(
            ProvisionRequest::builder()
                .server_name("Island")
                .server_password("hunter2")
                .max_players(12)
                .build(),
        )
        .await?;

    let spec = h.runtime.spec_of(&instance.sandbox_id)?;
    assert_eq!(spec.get_image(), DEFAULT_IMAGE);
    assert_eq!(spec.get_name(), &instance.name);
    assert_eq!(*spec.get_memory_limit_bytes(), Some(DEFAULT_MEMORY_LIMIT_BYTES));

    let bindings: Vec<_> = spec
        .get_port_bindings()
        .iter()
        .map(|p| (p.get_host(), p.get_guest(), p.get_protocol().as_str()))
        .collect();
    assert_eq!(
        bindings,
        vec![(8211, 8211, "udp"), (8211 + 16804, 27015, "udp")]
    );

    let volume = &spec.get_volume_binds()[0];
    assert_eq!(volume.get_guest().as_str(), SANDBOX_DATA_PATH);
    assert!(h.data_dir().join(&instance.name).is_dir());
    assert!(volume.get_host().as_str().ends_with(instance.name.as_str()));

    let env = |var: &str| {
        spec.get_env()
            .iter()
            .find(|e| e.get_var() == var)
            .map(|e| e.get_value().clone())
    };
    assert_eq!(env("SERVER_NAME").as_deref(), Some("Island"));
    assert_eq!(env("SERVER_PASSWORD").as_deref(), Some("hunter2"));
    assert_eq!(env("PLAYERS").as_deref(), Some("12"));
    assert_eq!(env("PORT").as_deref(), Some("8211"));
    assert_eq!(env("QUERY_PORT").as_deref(), Some("27015"));
    assert_eq!(env("PUID").as_deref(), Some("1000"));
    assert_eq!(env("RCON_ENABLED").as_deref(), Some("true"));
    assert_eq!(env("UPDATE_ON_BOOT").as_deref(), Some("true"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_provision_stores_initial_settings() -> anyhow::Result<()> {
    let h = harness()?;
    let instance = h
        .orchestrator
        .provision(
            ProvisionRequest::builder()
                .server_name("Island")
                .description("friends only")
                .max_players(8)
                .build(),
        )
        .await?;

    let settings = h.orchestrator.settings_store().read(&instance.id).await?;
    assert_eq!(settings.server_name, "Island");
    assert_eq!(settings.description, "friends only");
    assert_eq!(settings.max_players, 8);
    assert!(h
        .home
        .path()
        .join("settings")
        .join(format!("{}.json", instance.id))
        .is_file());
    Ok(())
}
