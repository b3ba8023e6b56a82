//! The servercontrol configuration file.

use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use getset::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    utils::{PUBLIC_ADDRESS_ENV_VAR, DOCKER_SOCKET_ENV_VAR},
    ServerControlError, ServerControlResult,
};

use super::{
    CONFIG_FILENAME, DATA_SUBDIR, DEFAULT_DELETE_GRACE_SECS, DEFAULT_FALLBACK_ADDRESS,
    DEFAULT_IMAGE, DEFAULT_LOGS_TAIL_LINES, DEFAULT_MEMORY_LIMIT_BYTES, DEFAULT_NAME_PREFIX,
    DEFAULT_PORT_RANGE_END, DEFAULT_PORT_RANGE_START, DEFAULT_PROVISION_ATTEMPTS,
    DEFAULT_QUERY_PORT_OFFSET, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_STATUS_TAIL_LINES, DEFAULT_STOP_GRACE_SECS,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Settings that shape how instances are provisioned and served.
///
/// Every field has a default, so an empty or missing `servercontrol.toml` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
#[serde(default)]
pub struct ServerControlConfig {
    /// The image instances are created from.
    #[builder(default = DEFAULT_IMAGE.to_string(), setter(into))]
    image: String,

    /// The prefix identifying managed sandboxes.
    #[builder(default = DEFAULT_NAME_PREFIX.to_string(), setter(into))]
    name_prefix: String,

    /// The range game ports are allocated from.
    #[builder(default)]
    port_range: PortRange,

    /// Added to the game port to obtain the published query port.
    #[builder(default = DEFAULT_QUERY_PORT_OFFSET)]
    query_port_offset: u16,

    /// Memory ceiling per sandbox.
    #[builder(default = DEFAULT_MEMORY_LIMIT_BYTES)]
    memory_limit_bytes: i64,

    /// Output lines scanned when inferring status.
    #[builder(default = DEFAULT_STATUS_TAIL_LINES)]
    status_tail_lines: usize,

    /// Output lines returned by the logs operation.
    #[builder(default = DEFAULT_LOGS_TAIL_LINES)]
    logs_tail_lines: usize,

    /// Grace period for an explicit stop.
    #[builder(default = DEFAULT_STOP_GRACE_SECS)]
    stop_grace_secs: u32,

    /// Grace period for the stop preceding a delete.
    #[builder(default = DEFAULT_DELETE_GRACE_SECS)]
    delete_grace_secs: u32,

    /// Address advertised to players, overriding detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    public_address: Option<String>,

    /// Address advertised when detection fails.
    #[builder(default = DEFAULT_FALLBACK_ADDRESS.to_string(), setter(into))]
    fallback_address: String,

    /// Where instance storage directories live. Defaults to `<home>/palworld-servers`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    data_dir: Option<PathBuf>,

    /// Host the HTTP server listens on.
    #[builder(default = DEFAULT_SERVER_HOST.to_string(), setter(into))]
    host: String,

    /// Port the HTTP server listens on.
    #[builder(default = DEFAULT_SERVER_PORT)]
    port: u16,

    /// Docker socket path. The local default is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    docker_socket: Option<String>,

    /// Provisioning attempts when retry on port conflict is requested.
    #[builder(default = DEFAULT_PROVISION_ATTEMPTS)]
    provision_attempts: u8,
}

/// An inclusive range of host ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    /// First port.
    pub start: u16,

    /// Last port, inclusive.
    pub end: u16,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerControlConfig {
    /// Loads the configuration from `<home>/servercontrol.toml`, falling back to defaults when the
    /// file does not exist, then applies environment overrides and validates the result.
    pub async fn load(home_dir: impl AsRef<Path>) -> ServerControlResult<Self> {
        let path = home_dir.as_ref().join(CONFIG_FILENAME);
        let mut config = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                tracing::debug!("loading configuration from {}", path.display());
                toml::from_str::<Self>(&contents)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Applies `SERVERCONTROL_PUBLIC_ADDRESS` and `SERVERCONTROL_DOCKER_SOCKET` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(address) = non_empty_env(PUBLIC_ADDRESS_ENV_VAR) {
            self.public_address = Some(address);
        }

        if let Some(socket) = non_empty_env(DOCKER_SOCKET_ENV_VAR) {
            self.docker_socket = Some(socket);
        }
    }

    /// Checks that the configured values can be used together.
    pub fn validate(&self) -> ServerControlResult<()> {
        if self.image.trim().is_empty() {
            return Err(ServerControlError::Config("image must not be empty".into()));
        }

        if self.name_prefix.is_empty() {
            return Err(ServerControlError::Config(
                "name_prefix must not be empty".into(),
            ));
        }

        if self.port_range.start == 0 || self.port_range.start > self.port_range.end {
            return Err(ServerControlError::Config(format!(
                "invalid port range {}",
                self.port_range
            )));
        }

        if self
            .port_range
            .end
            .checked_add(self.query_port_offset)
            .is_none()
        {
            return Err(ServerControlError::Config(format!(
                "query port offset {} pushes port range {} past 65535",
                self.query_port_offset, self.port_range
            )));
        }

        if usize::from(self.query_port_offset) < self.port_range.len() {
            return Err(ServerControlError::Config(format!(
                "query port offset {} overlaps port range {}",
                self.query_port_offset, self.port_range
            )));
        }

        if self.memory_limit_bytes <= 0 {
            return Err(ServerControlError::Config(
                "memory_limit_bytes must be positive".into(),
            ));
        }

        if self.status_tail_lines == 0 || self.logs_tail_lines == 0 {
            return Err(ServerControlError::Config(
                "tail line counts must be positive".into(),
            ));
        }

        if self.provision_attempts == 0 {
            return Err(ServerControlError::Config(
                "provision_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// The directory holding instance storage, given the servercontrol home directory.
    pub fn resolve_data_dir(&self, home_dir: impl AsRef<Path>) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| home_dir.as_ref().join(DATA_SUBDIR))
    }

    /// The address the HTTP server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PortRange {
    /// Creates a new inclusive range.
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// The ports in the range, lowest first.
    pub fn ports(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    /// Whether `port` is in the range.
    pub fn contains(&self, port: u16) -> bool {
        self.ports().contains(&port)
    }

    /// Number of ports in the range.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            usize::from(self.end - self.start) + 1
        }
    }

    /// Whether the range holds no ports.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for ServerControlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_RANGE_START, DEFAULT_PORT_RANGE_END)
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
