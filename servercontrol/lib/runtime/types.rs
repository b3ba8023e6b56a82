use getset::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::config::{EnvPair, PathPair, PortPair};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Length of the short sandbox id exposed to clients.
pub const SHORT_ID_LEN: usize = 12;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A sandbox as reported by the runtime's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSummary {
    /// Runtime-assigned id.
    pub id: String,

    /// Sandbox name, without any leading `/`.
    pub name: String,

    /// Raw runtime state, e.g. `running` or `exited`.
    pub state: String,

    /// Free-form status text, e.g. `Up 3 minutes`.
    pub status_text: String,

    /// Ports the sandbox exposes. Stopped sandboxes report no public bindings.
    pub ports: Vec<PublishedPort>,

    /// Image the sandbox was created from.
    pub image: String,
}

/// A sandbox port and, when bound, its host port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPort {
    /// Port inside the sandbox.
    pub private_port: u16,

    /// Host port, if published.
    pub public_port: Option<u16>,

    /// Transport protocol as the runtime reports it.
    pub protocol: String,
}

/// Everything needed to create a sandbox.
#[derive(Debug, Clone, PartialEq, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct SandboxSpec {
    /// Image reference.
    #[builder(setter(into))]
    image: String,

    /// Sandbox name.
    #[builder(setter(into))]
    name: String,

    /// Published ports. The exposed ports are derived from these.
    #[builder(default)]
    port_bindings: Vec<PortPair>,

    /// Memory ceiling in bytes.
    #[builder(default, setter(strip_option))]
    memory_limit_bytes: Option<i64>,

    /// Bind mounts.
    #[builder(default)]
    volume_binds: Vec<PathPair>,

    /// Environment variables.
    #[builder(default)]
    env: Vec<EnvPair>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SandboxSummary {
    /// Whether the runtime reports the sandbox as running.
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    /// The 12-character form of the id.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Host ports bound by this sandbox, regardless of protocol.
    pub fn public_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().filter_map(|p| p.public_port)
    }

    /// The host port bound to `private_port`, if any.
    pub fn public_port_for(&self, private_port: u16) -> Option<u16> {
        self.ports
            .iter()
            .find(|p| p.private_port == private_port && p.public_port.is_some())
            .and_then(|p| p.public_port)
    }
}

impl SandboxSpec {
    /// The sandbox-side port keys to expose, e.g. `8211/udp`, deduplicated in binding order.
    pub fn exposed_ports(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.port_bindings.len());
        for key in self.port_bindings.iter().map(PortPair::guest_key) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Truncates a sandbox id to the 12-character form clients see.
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: &str, ports: Vec<PublishedPort>) -> SandboxSummary {
        SandboxSummary {
            id: "4f1c2d3e4b5a69788796a5b4c3d2e1f0".to_string(),
            name: "palworld-server-1".to_string(),
            state: state.to_string(),
            status_text: String::new(),
            ports,
            image: "img".to_string(),
        }
    }

    #[test]
    fn test_summary_helpers() {
        let s = summary(
            "running",
            vec![
                PublishedPort {
                    private_port: 8211,
                    public_port: Some(8212),
                    protocol: "udp".to_string(),
                },
                PublishedPort {
                    private_port: 25575,
                    public_port: None,
                    protocol: "tcp".to_string(),
                },
            ],
        );

        assert!(s.is_running());
        assert_eq!(s.short_id(), "4f1c2d3e4b5a");
        assert_eq!(s.public_ports().collect::<Vec<_>>(), vec![8212]);
        assert_eq!(s.public_port_for(8211), Some(8212));
        assert_eq!(s.public_port_for(25575), None);

        assert!(!summary("exited", vec![]).is_running());
        assert!(summary("Running", vec![]).is_running());
    }

    #[test]
    fn test_short_id_of_short_input() {
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_spec_exposed_ports() {
        let spec = SandboxSpec::builder()
            .image("img")
            .name("palworld-server-1")
            .port_bindings(vec![
                PortPair::udp(8212, 8211),
                PortPair::udp(25016, 27015),
                PortPair::udp(8213, 8211),
            ])
            .build();

        assert_eq!(spec.exposed_ports(), vec!["8211/udp", "27015/udp"]);
        assert_eq!(spec.get_memory_limit_bytes(), &None);
    }
}
