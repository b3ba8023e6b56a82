use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard},
};

use crate::{config::PortRange, runtime::SandboxSummary, ServerControlError, ServerControlResult};

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Ports claimed by in-flight provisioning attempts in this process.
#[derive(Debug, Default)]
pub struct PortReservations {
    ports: Mutex<BTreeSet<u16>>,
}

/// A port held for one provisioning attempt. The claim is released on drop.
#[derive(Debug)]
pub struct PortReservation<'a> {
    port: u16,
    reservations: &'a PortReservations,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PortReservations {
    /// Picks the lowest port that is not bound in `snapshot`, not already reserved and not in
    /// `excluded`, and whose query port is free too, then reserves it. The pick and the claim
    /// happen under one lock.
    pub fn reserve(
        &self,
        snapshot: &[SandboxSummary],
        range: PortRange,
        query_port_offset: u16,
        excluded: &BTreeSet<u16>,
    ) -> ServerControlResult<PortReservation<'_>> {
        let mut reserved = self.lock();
        let unavailable = reserved.union(excluded).copied().collect();
        let port = allocate_port(snapshot, range, query_port_offset, &unavailable)?;
        reserved.insert(port);

        tracing::debug!("reserved port {port}");
        Ok(PortReservation {
            port,
            reservations: self,
        })
    }

    /// Ports currently reserved.
    pub fn reserved(&self) -> BTreeSet<u16> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<u16>> {
        self.ports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PortReservation<'_> {
    /// The reserved port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Orchestrator {
    /// Reserves the lowest free port of the configured range against a fresh listing of every
    /// sandbox, managed or not. Ports in `excluded` are skipped.
    pub(crate) async fn reserve_port(
        &self,
        excluded: &BTreeSet<u16>,
    ) -> ServerControlResult<PortReservation<'_>> {
        let snapshot = self.runtime.list(true).await?;
        self.reservations.reserve(
            &snapshot,
            *self.config.get_port_range(),
            *self.config.get_query_port_offset(),
            excluded,
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Host ports bound by any of the sandboxes, regardless of protocol.
pub fn occupied_ports(sandboxes: &[SandboxSummary]) -> BTreeSet<u16> {
    sandboxes
        .iter()
        .flat_map(SandboxSummary::public_ports)
        .collect()
}

/// Returns the lowest port of `range` that is neither bound by a sandbox nor in `reserved`, and
/// whose query port (`port + query_port_offset`) is free as well.
///
/// The query ports of reserved game ports count as taken.
pub fn allocate_port(
    sandboxes: &[SandboxSummary],
    range: PortRange,
    query_port_offset: u16,
    reserved: &BTreeSet<u16>,
) -> ServerControlResult<u16> {
    let mut taken = occupied_ports(sandboxes);
    taken.extend(reserved.iter().copied());
    taken.extend(
        reserved
            .iter()
            .filter_map(|port| port.checked_add(query_port_offset)),
    );

    range
        .ports()
        .find(|port| {
            port.checked_add(query_port_offset)
                .is_some_and(|query_port| !taken.contains(port) && !taken.contains(&query_port))
        })
        .ok_or(ServerControlError::NoCapacity {
            start: range.start,
            end: range.end,
        })
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Drop for PortReservation<'_> {
    fn drop(&mut self) {
        self.reservations.lock().remove(&self.port);
        tracing::trace!("released port {}", self.port);
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
