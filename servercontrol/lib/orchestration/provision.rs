use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::{
    config::{
        EnvPair, PathPair, PortPair, DEFAULT_MAX_PLAYERS, DEFAULT_PUID, GAME_PORT, MAX_PLAYERS,
        QUERY_PORT, RCON_PORT, SANDBOX_DATA_PATH,
    },
    runtime::{short_id, SandboxSpec},
    settings::Settings,
    RuntimeError, ServerControlError, ServerControlResult,
};

use super::{naming, storage, Orchestrator};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A request for a new instance.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ProvisionRequest {
    /// Display name of the game server.
    #[builder(setter(into))]
    server_name: String,

    /// Join password. Empty means none.
    #[builder(default, setter(into))]
    server_password: String,

    /// Player cap, `1..=32`.
    #[builder(default = DEFAULT_MAX_PLAYERS)]
    max_players: u32,

    /// Free-form description, stored with the settings.
    #[builder(default, setter(into))]
    description: String,

    /// Re-allocate and try again when the allocated port turns out to be bound.
    #[builder(default)]
    retry_on_conflict: bool,
}

/// A freshly provisioned, started instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedInstance {
    /// The 12-character instance id.
    pub id: String,

    /// The full sandbox id.
    #[serde(skip)]
    pub sandbox_id: String,

    /// The sandbox name.
    pub name: String,

    /// The published game port.
    pub port: u16,

    /// The published query port.
    pub query_port: u16,

    /// When the instance was provisioned.
    pub created_at: DateTime<Utc>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProvisionRequest {
    /// Rejects requests that would produce an unusable instance.
    pub fn validate(&self) -> ServerControlResult<()> {
        if self.server_name.trim().is_empty() {
            return Err(ServerControlError::InvalidArgument(
                "server name is required".into(),
            ));
        }

        if !(1..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(ServerControlError::InvalidArgument(format!(
                "max players must be between 1 and {MAX_PLAYERS}, got {}",
                self.max_players
            )));
        }

        Ok(())
    }

    /// The settings stored for the instance when it is created.
    pub fn initial_settings(&self) -> Settings {
        Settings {
            server_name: self.server_name.clone(),
            description: self.description.clone(),
            password: self.server_password.clone(),
            max_players: self.max_players,
            ..Settings::default()
        }
    }
}

impl Orchestrator {
    /// Provisions and starts a new instance.
    ///
    /// Steps run strictly in order: validate, name, pull, allocate a port, prepare storage, create
    /// the sandbox, start it and store the initial settings. Failures before the sandbox is
    /// created leave nothing behind. After that, failures are reported with the sandbox id and
    /// the sandbox is left for the caller to delete, unless `retry_on_conflict` was requested, in
    /// which case a sandbox that lost a port race is removed and allocation runs again.
    pub async fn provision(
        &self,
        request: ProvisionRequest,
    ) -> ServerControlResult<ProvisionedInstance> {
        request.validate()?;

        let name = naming::generate_instance_name(self.config.get_name_prefix())?;
        let image = self.config.get_image();

        info!("provisioning {name} from {image}");
        self.runtime
            .pull(image)
            .await
            .map_err(|source| ServerControlError::ImageUnavailable {
                image: image.clone(),
                source,
            })?;

        let attempts = if request.retry_on_conflict {
            *self.config.get_provision_attempts()
        } else {
            1
        };

        let mut attempt = 1;
        let mut conflicted = BTreeSet::new();
        let (sandbox_id, port, query_port) = loop {
            match self.create_and_start(&name, &request, &conflicted).await {
                Err(ServerControlError::PortConflict {
                    port,
                    query_port,
                    sandbox_id,
                }) if attempt < attempts => {
                    warn!(
                        "port {port} or query port {query_port} was taken while provisioning \
                         {name}, retrying (attempt {attempt} of {attempts})"
                    );
                    if let Some(id) = sandbox_id {
                        if let Err(e) = self.runtime.remove(&id, true).await {
                            warn!("failed to remove conflicting sandbox {id}: {e}");
                        }
                    }
                    conflicted.insert(port);
                    attempt += 1;
                }
                result => break result?,
            }
        };

        let id = short_id(&sandbox_id).to_string();
        if let Err(e) = self
            .settings
            .write(&id, &request.initial_settings())
            .await
        {
            warn!("failed to store initial settings for {id}: {e}");
        }

        info!("provisioned {name} ({id}) on port {port}");
        Ok(ProvisionedInstance {
            id,
            sandbox_id,
            name,
            port,
            query_port,
            created_at: Utc::now(),
        })
    }

    /// Allocates a port outside `conflicted`, prepares storage, then creates and starts the
    /// sandbox.
    ///
    /// The port stays reserved until this returns, at which point a started sandbox reports the
    /// binding itself.
    async fn create_and_start(
        &self,
        name: &str,
        request: &ProvisionRequest,
        conflicted: &BTreeSet<u16>,
    ) -> ServerControlResult<(String, u16, u16)> {
        let reservation = self.reserve_port(conflicted).await?;
        let port = reservation.port();
        let query_port = port
            .checked_add(*self.config.get_query_port_offset())
            .ok_or_else(|| {
                ServerControlError::Config(format!("query port for game port {port} overflows"))
            })?;

        let storage_dir = storage::prepare_storage_dir(&self.data_dir, name).await?;
        let spec = self.sandbox_spec(name, request, port, query_port, &storage_dir);

        let sandbox_id = self.runtime.create(&spec).await.map_err(|e| match e {
            RuntimeError::PortAllocated(_) => ServerControlError::PortConflict {
                port,
                query_port,
                sandbox_id: None,
            },
            other => ServerControlError::Runtime(other),
        })?;

        tracing::debug!("created sandbox {sandbox_id} for {name}");
        self.runtime.start(&sandbox_id).await.map_err(|e| match e {
            RuntimeError::PortAllocated(_) => ServerControlError::PortConflict {
                port,
                query_port,
                sandbox_id: Some(sandbox_id.clone()),
            },
            source => ServerControlError::StartAfterCreateFailed {
                sandbox_id: sandbox_id.clone(),
                source,
            },
        })?;

        Ok((sandbox_id, port, query_port))
    }

    fn sandbox_spec(
        &self,
        name: &str,
        request: &ProvisionRequest,
        port: u16,
        query_port: u16,
        storage_dir: &std::path::Path,
    ) -> SandboxSpec {
        let env = vec![
            EnvPair::new("PUID", DEFAULT_PUID.to_string()),
            EnvPair::new("PGID", DEFAULT_PUID.to_string()),
            EnvPair::new("PORT", GAME_PORT.to_string()),
            EnvPair::new("QUERY_PORT", QUERY_PORT.to_string()),
            EnvPair::flag("MULTITHREADING", true),
            EnvPair::flag("RCON_ENABLED", true),
            EnvPair::new("RCON_PORT", RCON_PORT.to_string()),
            EnvPair::new("TZ", "UTC"),
            EnvPair::new("SERVER_NAME", request.server_name.as_str()),
            EnvPair::new("SERVER_PASSWORD", request.server_password.as_str()),
            EnvPair::new("PLAYERS", request.max_players.to_string()),
            EnvPair::flag("COMMUNITY", false),
            EnvPair::flag("UPDATE_ON_BOOT", true),
        ];

        SandboxSpec::builder()
            .image(self.config.get_image().as_str())
            .name(name)
            .port_bindings(vec![
                PortPair::udp(port, GAME_PORT),
                PortPair::udp(query_port, QUERY_PORT),
            ])
            .memory_limit_bytes(*self.config.get_memory_limit_bytes())
            .volume_binds(vec![PathPair::from_host_path(
                storage_dir,
                SANDBOX_DATA_PATH,
            )])
            .env(env)
            .build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
