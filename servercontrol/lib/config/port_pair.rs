use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A published port: a host port bound to a sandbox port over one transport protocol.
///
/// Displays in Docker's `-p` form, `host:guest/proto`.
///
/// ## Examples
///
/// ```
/// use servercontrol::config::{PortPair, Protocol};
///
/// let game = PortPair::udp(8212, 8211);
/// assert_eq!(game.to_string(), "8212:8211/udp");
/// assert_eq!(game.get_protocol(), Protocol::Udp);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortPair {
    host: u16,
    guest: u16,
    protocol: Protocol,
}

/// The transport protocol of a published port.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,

    /// UDP.
    Udp,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PortPair {
    /// Creates a new `PortPair`.
    pub fn new(host: u16, guest: u16, protocol: Protocol) -> Self {
        Self {
            host,
            guest,
            protocol,
        }
    }

    /// Creates a UDP `PortPair`, which is what game traffic uses.
    pub fn udp(host: u16, guest: u16) -> Self {
        Self::new(host, guest, Protocol::Udp)
    }

    /// Creates a TCP `PortPair`.
    pub fn tcp(host: u16, guest: u16) -> Self {
        Self::new(host, guest, Protocol::Tcp)
    }

    /// Returns the host port.
    pub fn get_host(&self) -> u16 {
        self.host
    }

    /// Returns the guest port.
    pub fn get_guest(&self) -> u16 {
        self.guest
    }

    /// Returns the protocol.
    pub fn get_protocol(&self) -> Protocol {
        self.protocol
    }

    /// The sandbox-side key Docker uses for exposed ports and bindings, e.g. `8211/udp`.
    pub fn guest_key(&self) -> String {
        format!("{}/{}", self.guest, self.protocol)
    }
}

impl Protocol {
    /// Returns the protocol as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.guest, self.protocol)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
