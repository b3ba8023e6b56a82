use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    runtime::{PublishedPort, SandboxRuntime, SandboxSpec, SandboxSummary},
    RuntimeError, RuntimeResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`SandboxRuntime`] that keeps sandboxes in memory.
///
/// It mirrors the Docker behaviors servercontrol relies on: ports are only bound while a sandbox
/// runs, a second bind of the same host port fails, stopping a stopped sandbox is `NotModified`
/// and creating from an image that was never pulled is `NotFound`. It backs dry runs and tests.
#[derive(Debug)]
pub struct MemoryRuntime {
    state: Mutex<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    sandboxes: Vec<MemorySandbox>,
    images: BTreeSet<String>,
    foreign_ports: BTreeSet<u16>,
    registry_reachable: bool,
    start_failure: Option<RuntimeError>,
    logs_failure: Option<RuntimeError>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct MemorySandbox {
    id: String,
    spec: SandboxSpec,
    running: bool,
    output: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MemoryRuntime {
    /// Creates an empty runtime with a reachable registry.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                sandboxes: Vec::new(),
                images: BTreeSet::new(),
                foreign_ports: BTreeSet::new(),
                registry_reachable: true,
                start_failure: None,
                logs_failure: None,
                next_seq: 1,
            }),
        }
    }

    /// Makes subsequent pulls succeed or fail with [`RuntimeError::Unavailable`].
    pub fn set_registry_reachable(&self, reachable: bool) {
        self.lock().registry_reachable = reachable;
    }

    /// Marks an image as present locally without pulling it.
    pub fn add_image(&self, image: impl Into<String>) {
        self.lock().images.insert(image.into());
    }

    /// Claims a host port outside of any sandbox, as another process on the host would.
    pub fn occupy_host_port(&self, port: u16) {
        self.lock().foreign_ports.insert(port);
    }

    /// Makes every start fail with `error` until cleared with `None`.
    pub fn set_start_failure(&self, error: Option<RuntimeError>) {
        self.lock().start_failure = error;
    }

    /// Makes every logs call fail with `error` until cleared with `None`.
    pub fn set_logs_failure(&self, error: Option<RuntimeError>) {
        self.lock().logs_failure = error;
    }

    /// Appends lines to a sandbox's output.
    pub fn push_output(&self, handle: &str, text: &str) -> RuntimeResult<()> {
        let mut state = self.lock();
        let index = state.resolve(handle)?;
        state.sandboxes[index]
            .output
            .extend(text.lines().map(str::to_string));
        Ok(())
    }

    /// The [`SandboxSpec`] a sandbox was created with.
    pub fn spec_of(&self, handle: &str) -> RuntimeResult<SandboxSpec> {
        let state = self.lock();
        let index = state.resolve(handle)?;
        Ok(state.sandboxes[index].spec.clone())
    }

    /// Number of sandboxes, running or not.
    pub fn sandbox_count(&self) -> usize {
        self.lock().sandboxes.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the state half-updated.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MemoryState {
    /// Finds a sandbox by id, name or unique id prefix.
    fn resolve(&self, handle: &str) -> RuntimeResult<usize> {
        if handle.is_empty() {
            return Err(RuntimeError::NotFound(handle.to_string()));
        }

        if let Some(index) = self
            .sandboxes
            .iter()
            .position(|s| s.id == handle || s.spec.get_name() == handle)
        {
            return Ok(index);
        }

        let mut matches = self
            .sandboxes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.id.starts_with(handle));

        match (matches.next(), matches.next()) {
            (Some((index, _)), None) => Ok(index),
            _ => Err(RuntimeError::NotFound(format!(
                "no such container: {handle}"
            ))),
        }
    }

    fn next_id(&mut self) -> String {
        let seq = self.next_seq;
        self.next_seq += 1;
        let mixed = seq.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        format!("{mixed:016x}{:016x}{mixed:016x}{seq:016x}", !mixed)
    }

    fn bound_host_ports(&self, except: usize) -> BTreeSet<u16> {
        self.sandboxes
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != except && s.running)
            .flat_map(|(_, s)| s.spec.get_port_bindings().iter().map(|p| p.get_host()))
            .chain(self.foreign_ports.iter().copied())
            .collect()
    }
}

impl MemorySandbox {
    fn summary(&self) -> SandboxSummary {
        let ports = if self.running {
            self.spec
                .get_port_bindings()
                .iter()
                .map(|p| PublishedPort {
                    private_port: p.get_guest(),
                    public_port: Some(p.get_host()),
                    protocol: p.get_protocol().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        SandboxSummary {
            id: self.id.clone(),
            name: self.spec.get_name().clone(),
            state: if self.running { "running" } else { "exited" }.to_string(),
            status_text: if self.running { "Up" } else { "Exited (0)" }.to_string(),
            ports,
            image: self.spec.get_image().clone(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxRuntime for MemoryRuntime {
    async fn list(&self, all: bool) -> RuntimeResult<Vec<SandboxSummary>> {
        let state = self.lock();
        Ok(state
            .sandboxes
            .iter()
            .filter(|s| all || s.running)
            .map(MemorySandbox::summary)
            .collect())
    }

    async fn pull(&self, image: &str) -> RuntimeResult<()> {
        let mut state = self.lock();
        if !state.registry_reachable {
            return Err(RuntimeError::Unavailable(format!(
                "registry unreachable while pulling {image}"
            )));
        }

        state.images.insert(image.to_string());
        Ok(())
    }

    async fn create(&self, spec: &SandboxSpec) -> RuntimeResult<String> {
        let mut state = self.lock();
        if !state.images.contains(spec.get_image()) {
            return Err(RuntimeError::NotFound(format!(
                "no such image: {}",
                spec.get_image()
            )));
        }

        if state
            .sandboxes
            .iter()
            .any(|s| s.spec.get_name() == spec.get_name())
        {
            return Err(RuntimeError::Conflict(format!(
                "container name {} is already in use",
                spec.get_name()
            )));
        }

        let id = state.next_id();
        state.sandboxes.push(MemorySandbox {
            id: id.clone(),
            spec: spec.clone(),
            running: false,
            output: Vec::new(),
        });

        Ok(id)
    }

    async fn start(&self, handle: &str) -> RuntimeResult<()> {
        let mut state = self.lock();
        let index = state.resolve(handle)?;
        if state.sandboxes[index].running {
            return Ok(());
        }

        if let Some(error) = state.start_failure.clone() {
            return Err(error);
        }

        let bound = state.bound_host_ports(index);
        if let Some(port) = state.sandboxes[index]
            .spec
            .get_port_bindings()
            .iter()
            .map(|p| p.get_host())
            .find(|port| bound.contains(port))
        {
            return Err(RuntimeError::PortAllocated(format!(
                "Bind for 0.0.0.0:{port} failed: port is already allocated"
            )));
        }

        state.sandboxes[index].running = true;
        Ok(())
    }

    async fn stop(&self, handle: &str, _grace_secs: u32) -> RuntimeResult<()> {
        let mut state = self.lock();
        let index = state.resolve(handle)?;
        let sandbox = &mut state.sandboxes[index];
        if !sandbox.running {
            return Err(RuntimeError::NotModified(format!(
                "container {} is not running",
                sandbox.id
            )));
        }

        sandbox.running = false;
        Ok(())
    }

    async fn remove(&self, handle: &str, force: bool) -> RuntimeResult<()> {
        let mut state = self.lock();
        let index = state.resolve(handle)?;
        if state.sandboxes[index].running && !force {
            return Err(RuntimeError::Conflict(format!(
                "cannot remove running container {}",
                state.sandboxes[index].id
            )));
        }

        state.sandboxes.remove(index);
        Ok(())
    }

    async fn logs(&self, handle: &str, tail_lines: usize) -> RuntimeResult<String> {
        let state = self.lock();
        if let Some(error) = state.logs_failure.clone() {
            return Err(error);
        }

        let index = state.resolve(handle)?;
        let output = &state.sandboxes[index].output;
        let skip = output.len().saturating_sub(tail_lines);
        Ok(output[skip..].join("\n"))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
