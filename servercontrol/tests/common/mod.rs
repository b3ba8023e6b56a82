#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use servercontrol::{
    config::{PortRange, ServerControlConfig},
    orchestration::Orchestrator,
    runtime::{MemoryRuntime, SandboxRuntime, SandboxSpec, SandboxSummary},
    settings::FileSettingsStore,
    RuntimeResult,
};
use tempfile::TempDir;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

pub const PUBLIC_ADDRESS: &str = "203.0.113.7";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An orchestrator over an in-memory runtime, with its home directory in a temp dir.
pub struct Harness {
    pub runtime: Arc<MemoryRuntime>,
    pub orchestrator: Orchestrator,
    pub home: TempDir,
}

/// A runtime whose listing is frozen at a snapshot, as seen by a provisioner that lost a race.
pub struct StaleListRuntime {
    pub inner: Arc<MemoryRuntime>,
    pub snapshot: Vec<SandboxSummary>,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// A harness with the default port range.
pub fn harness() -> anyhow::Result<Harness> {
    harness_with_range(PortRange::default())
}

/// A harness whose ports are allocated from `range`.
pub fn harness_with_range(range: PortRange) -> anyhow::Result<Harness> {
    let home = tempfile::tempdir()?;
    let runtime = Arc::new(MemoryRuntime::new());
    let orchestrator = orchestrator_over(runtime.clone(), &home, range);

    Ok(Harness {
        runtime,
        orchestrator,
        home,
    })
}

/// An orchestrator that shares `home` with another, but drives `runtime`.
pub fn orchestrator_over(
    runtime: Arc<dyn SandboxRuntime>,
    home: &TempDir,
    range: PortRange,
) -> Orchestrator {
    let config = ServerControlConfig::builder()
        .port_range(range)
        .public_address(PUBLIC_ADDRESS)
        .build();

    Orchestrator::new(
        runtime,
        Arc::new(FileSettingsStore::new(home.path().join("settings"))),
        config,
        home.path().join("palworld-servers"),
    )
}

impl Harness {
    pub fn data_dir(&self) -> PathBuf {
        self.orchestrator.data_dir().to_path_buf()
    }

    /// Creates and starts an unmanaged sandbox publishing `host_port`.
    pub async fn run_foreign_sandbox(&self, name: &str, host_port: u16) -> anyhow::Result<String> {
        self.runtime.add_image("nginx:latest");
        let spec = SandboxSpec::builder()
            .image("nginx:latest")
            .name(name)
            .port_bindings(vec![servercontrol::config::PortPair::tcp(host_port, 80)])
            .build();

        let id = self.runtime.create(&spec).await?;
        self.runtime.start(&id).await?;
        Ok(id)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl SandboxRuntime for StaleListRuntime {
    async fn list(&self, _all: bool) -> RuntimeResult<Vec<SandboxSummary>> {
        Ok(self.snapshot.clone())
    }

    async fn pull(&self, image: &str) -> RuntimeResult<()> {
        self.inner.pull(image).await
    }

    async fn create(&self, spec: &SandboxSpec) -> RuntimeResult<String> {
        self.inner.create(spec).await
    }

    async fn start(&self, handle: &str) -> RuntimeResult<()> {
        self.inner.start(handle).await
    }

    async fn stop(&self, handle: &str, grace_secs: u32) -> RuntimeResult<()> {
        self.inner.stop(handle, grace_secs).await
    }

    async fn remove(&self, handle: &str, force: bool) -> RuntimeResult<()> {
        self.inner.remove(handle, force).await
    }

    async fn logs(&self, handle: &str, tail_lines: usize) -> RuntimeResult<String> {
        self.inner.logs(handle, tail_lines).await
    }
}
