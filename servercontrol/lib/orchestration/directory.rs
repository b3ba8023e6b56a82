use futures::future;
use serde::{Deserialize, Serialize};

use crate::{
    config::GAME_PORT,
    runtime::{PublishedPort, SandboxSummary},
    ServerControlResult,
};

use super::{LifecyclePhase, Orchestrator};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One managed instance as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    /// The 12-character instance id.
    pub id: String,

    /// The sandbox name.
    pub name: String,

    /// Raw runtime state, e.g. `running`.
    pub status: String,

    /// Runtime status text, e.g. `Up 5 minutes`.
    pub state: String,

    /// The inferred lifecycle phase.
    pub detail_status: LifecyclePhase,

    /// Published game port, or `None` while stopped.
    pub game_port: Option<u16>,

    /// Address players connect to.
    #[serde(rename = "publicIP")]
    pub public_ip: String,

    /// All ports the runtime reports.
    pub ports: Vec<PublishedPort>,

    /// Image the sandbox runs.
    pub image: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Lists the managed instances, running or not, with their inferred phase and public endpoint.
    ///
    /// Statuses are inferred concurrently and the public address is resolved once for the batch.
    /// `request_host` is the `Host` the caller addressed, if known.
    pub async fn list_instances(
        &self,
        request_host: Option<&str>,
    ) -> ServerControlResult<Vec<InstanceView>> {
        let sandboxes: Vec<SandboxSummary> = self
            .runtime
            .list(true)
            .await?
            .into_iter()
            .filter(|s| self.is_managed(&s.name))
            .collect();

        let (phases, public_ip) = future::join(
            future::join_all(sandboxes.iter().map(|s| self.infer_status(s))),
            self.public_address(request_host),
        )
        .await;

        Ok(sandboxes
            .into_iter()
            .zip(phases)
            .map(|(sandbox, phase)| InstanceView {
                id: sandbox.short_id().to_string(),
                game_port: sandbox.public_port_for(GAME_PORT),
                name: sandbox.name,
                status: sandbox.state,
                state: sandbox.status_text,
                detail_status: phase,
                public_ip: public_ip.clone(),
                ports: sandbox.ports,
                image: sandbox.image,
            })
            .collect())
    }
}
