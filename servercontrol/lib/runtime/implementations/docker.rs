use std::collections::HashMap;

use async_trait::async_trait;
use bollard::{
    errors::Error as BollardError,
    models::{ContainerCreateBody, ContainerSummary, HostConfig, PortBinding},
    query_parameters::{
        CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
        LogsOptionsBuilder, RemoveContainerOptionsBuilder, StartContainerOptions,
        StopContainerOptionsBuilder,
    },
    Docker, API_DEFAULT_VERSION,
};
use futures::TryStreamExt;

use crate::{
    runtime::{PublishedPort, SandboxRuntime, SandboxSpec, SandboxSummary},
    RuntimeError, RuntimeResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Seconds to wait on a Docker API response before giving up.
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Messages Docker uses when a published host port cannot be bound.
const PORT_IN_USE_MARKERS: [&str; 2] = ["port is already allocated", "address already in use"];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`SandboxRuntime`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl DockerRuntime {
    /// Connects to Docker through `socket`, or through the local defaults (`DOCKER_HOST` or the
    /// platform socket) when `socket` is `None`.
    ///
    /// No request is made, so an unreachable daemon only shows up on the first call.
    pub fn connect(socket: Option<&str>) -> RuntimeResult<Self> {
        let docker = match socket {
            Some(path) => Docker::connect_with_socket(path, DOCKER_TIMEOUT_SECS, API_DEFAULT_VERSION),
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(map_error)?;

        tracing::debug!(socket = ?socket, "connected docker client");
        Ok(Self { docker })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl SandboxRuntime for DockerRuntime {
    async fn list(&self, all: bool) -> RuntimeResult<Vec<SandboxSummary>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptionsBuilder::new().all(all).build()))
            .await
            .map_err(map_error)?;

        Ok(containers.into_iter().map(to_summary).collect())
    }

    async fn pull(&self, image: &str) -> RuntimeResult<()> {
        let (from_image, tag) = split_image_reference(image);
        tracing::info!("pulling image {from_image}:{tag}");

        self.docker
            .create_image(
                Some(
                    CreateImageOptionsBuilder::new()
                        .from_image(from_image)
                        .tag(tag)
                        .build(),
                ),
                None,
                None,
            )
            .try_collect::<Vec<_>>()
            .await
            .map_err(map_error)?;

        Ok(())
    }

    async fn create(&self, spec: &SandboxSpec) -> RuntimeResult<String> {
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        for pair in spec.get_port_bindings() {
            port_bindings
                .entry(pair.guest_key())
                .or_insert_with(|| Some(Vec::new()))
                .get_or_insert_with(Vec::new)
                .push(PortBinding {
                    host_ip: None,
                    host_port: Some(pair.get_host().to_string()),
                });
        }

        let exposed_ports = spec
            .exposed_ports()
            .into_iter()
            .map(|key| (key, HashMap::new()))
            .collect::<HashMap<_, _>>();

        let body = ContainerCreateBody {
            image: Some(spec.get_image().clone()),
            env: Some(spec.get_env().iter().map(ToString::to_string).collect()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                binds: Some(
                    spec.get_volume_binds()
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                ),
                memory: *spec.get_memory_limit_bytes(),
                ..HostConfig::default()
            }),
            ..ContainerCreateBody::default()
        };

        let response = self
            .docker
            .create_container(
                Some(
                    CreateContainerOptionsBuilder::new()
                        .name(spec.get_name())
                        .build(),
                ),
                body,
            )
            .await
            .map_err(map_error)?;

        for warning in &response.warnings {
            tracing::warn!("docker warning creating {}: {warning}", spec.get_name());
        }

        Ok(response.id)
    }

    async fn start(&self, handle: &str) -> RuntimeResult<()> {
        match self
            .docker
            .start_container(handle, None::<StartContainerOptions>)
            .await
            .map_err(map_error)
        {
            Ok(()) | Err(RuntimeError::NotModified(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn stop(&self, handle: &str, grace_secs: u32) -> RuntimeResult<()> {
        let grace = i32::try_from(grace_secs).unwrap_or(i32::MAX);
        self.docker
            .stop_container(handle, Some(StopContainerOptionsBuilder::new().t(grace).build()))
            .await
            .map_err(map_error)
    }

    async fn remove(&self, handle: &str, force: bool) -> RuntimeResult<()> {
        self.docker
            .remove_container(
                handle,
                Some(RemoveContainerOptionsBuilder::new().force(force).build()),
            )
            .await
            .map_err(map_error)
    }

    async fn logs(&self, handle: &str, tail_lines: usize) -> RuntimeResult<String> {
        let chunks = self
            .docker
            .logs(
                handle,
                Some(
                    LogsOptionsBuilder::new()
                        .stdout(true)
                        .stderr(true)
                        .tail(&tail_lines.to_string())
                        .build(),
                ),
            )
            .try_collect::<Vec<_>>()
            .await
            .map_err(map_error)?;

        let bytes = chunks
            .into_iter()
            .flat_map(|chunk| chunk.into_bytes())
            .collect::<Vec<u8>>();

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn to_summary(container: ContainerSummary) -> SandboxSummary {
    let name = container
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();

    let ports = container
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|port| PublishedPort {
            private_port: port.private_port,
            public_port: port.public_port,
            protocol: port.typ.map(|t| t.to_string()).unwrap_or_default(),
        })
        .collect();

    SandboxSummary {
        id: container.id.unwrap_or_default(),
        name,
        state: container.state.map(|s| s.to_string()).unwrap_or_default(),
        status_text: container.status.unwrap_or_default(),
        ports,
        image: container.image.unwrap_or_default(),
    }
}

/// Splits `repo[:tag]` into repository and tag, defaulting the tag to `latest`.
///
/// A colon that belongs to a registry host (`host:5000/repo`) is not a tag separator.
fn split_image_reference(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') && !repo.is_empty() => (repo, tag),
        _ => (image, "latest"),
    }
}

/// Maps a Docker API error to a [`RuntimeError`].
fn map_error(error: BollardError) -> RuntimeError {
    match error {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => classify_response(status_code, message),
        BollardError::DockerStreamError { error } => classify_response(500, error),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

fn classify_response(status_code: u16, message: String) -> RuntimeError {
    let lower = message.to_ascii_lowercase();
    match status_code {
        304 => RuntimeError::NotModified(message),
        404 => RuntimeError::NotFound(message),
        409 => RuntimeError::Conflict(message),
        _ if PORT_IN_USE_MARKERS.iter().any(|m| lower.contains(m)) => {
            RuntimeError::PortAllocated(message)
        }
        status => RuntimeError::Api { status, message },
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_image_reference() {
        assert_eq!(
            split_image_reference("thijsvanloef/palworld-server-docker:latest"),
            ("thijsvanloef/palworld-server-docker", "latest")
        );
        assert_eq!(split_image_reference("alpine"), ("alpine", "latest"));
        assert_eq!(
            split_image_reference("registry.local:5000/palworld"),
            ("registry.local:5000/palworld", "latest")
        );
        assert_eq!(
            split_image_reference("registry.local:5000/palworld:v2"),
            ("registry.local:5000/palworld", "v2")
        );
    }

    #[test]
    fn test_classify_response() {
        assert_eq!(
            classify_response(404, "No such container: x".into()),
            RuntimeError::NotFound("No such container: x".into())
        );
        assert!(matches!(
            classify_response(304, String::new()),
            RuntimeError::NotModified(_)
        ));
        assert!(matches!(
            classify_response(409, "name in use".into()),
            RuntimeError::Conflict(_)
        ));
        assert!(matches!(
            classify_response(
                500,
                "driver failed programming external connectivity: Bind for 0.0.0.0:8212 failed: port is already allocated".into()
            ),
            RuntimeError::PortAllocated(_)
        ));
        assert!(matches!(
            classify_response(500, "listen udp4 0.0.0.0:8212: bind: Address already in use".into()),
            RuntimeError::PortAllocated(_)
        ));
        assert_eq!(
            classify_response(500, "boom".into()),
            RuntimeError::Api {
                status: 500,
                message: "boom".into()
            }
        );
    }
}
