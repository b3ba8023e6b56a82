use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{config::ServerControlConfig, runtime::SandboxRuntime, settings::SettingsStore};

use super::PortReservations;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The instance lifecycle orchestrator.
///
/// It keeps no registry of instances: every operation reads through to the runtime, which is the
/// source of truth. The only state it owns is the set of ports reserved by provisioning attempts
/// still in flight, so it can be shared as `Arc<Orchestrator>` and driven concurrently.
pub struct Orchestrator {
    /// The container runtime.
    pub(super) runtime: Arc<dyn SandboxRuntime>,

    /// Where instance settings are kept.
    pub(super) settings: Arc<dyn SettingsStore>,

    /// The servercontrol configuration.
    pub(super) config: ServerControlConfig,

    /// The directory holding per-instance storage directories.
    pub(super) data_dir: PathBuf,

    /// Ports claimed by in-flight provisioning.
    pub(super) reservations: PortReservations,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        runtime: Arc<dyn SandboxRuntime>,
        settings: Arc<dyn SettingsStore>,
        config: ServerControlConfig,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            settings,
            config,
            data_dir: data_dir.into(),
            reservations: PortReservations::default(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ServerControlConfig {
        &self.config
    }

    /// The directory holding per-instance storage directories.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The settings store.
    pub fn settings_store(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// Whether a sandbox name marks a managed instance.
    pub fn is_managed(&self, name: &str) -> bool {
        name.starts_with(self.config.get_name_prefix().as_str())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("data_dir", &self.data_dir)
            .field("reservations", &self.reservations)
            .finish_non_exhaustive()
    }
}
