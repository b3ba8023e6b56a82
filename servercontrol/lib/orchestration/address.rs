use std::net::IpAddr;

use tokio::net::UdpSocket;

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// A routable address used only to select the outbound interface. Nothing is sent to it.
const PROBE_TARGET: &str = "8.8.8.8:80";

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Resolves the address players should connect to, in order of preference:
    ///
    /// 1. the configured override
    /// 2. the host the request was addressed to, unless it is local
    /// 3. the address of the interface that routes outbound traffic
    /// 4. the configured fallback
    pub async fn public_address(&self, request_host: Option<&str>) -> String {
        if let Some(address) = self.config.get_public_address() {
            return address.clone();
        }

        if let Some(host) = request_host.and_then(host_without_port) {
            if !is_local_host(host) {
                return host.to_string();
            }
        }

        match probe_local_address().await {
            Some(ip) => ip.to_string(),
            None => self.config.get_fallback_address().clone(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Strips the port from a `Host` header value, keeping IPv6 addresses intact.
pub fn host_without_port(host: &str) -> Option<&str> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }

    if let Some(rest) = host.strip_prefix('[') {
        return rest.split_once(']').map(|(ip, _)| ip).filter(|ip| !ip.is_empty());
    }

    // More than one colon without brackets is a bare IPv6 address.
    if host.matches(':').count() > 1 {
        return Some(host);
    }

    host.split(':').next().filter(|h| !h.is_empty())
}

/// Whether `host` names this machine rather than a reachable address.
pub fn is_local_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => false,
    }
}

/// Finds the local address of the default route by connecting a UDP socket.
async fn probe_local_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    if let Err(e) = socket.connect(PROBE_TARGET).await {
        tracing::debug!("local address probe failed: {e}");
        return None;
    }

    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified() && !ip.is_loopback()).then_some(ip)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
