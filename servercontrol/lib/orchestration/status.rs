use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runtime::SandboxSummary;

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Printed by the game server once it accepts players.
pub const READINESS_MARKER: &str = "server is running";

/// Printed while the game files are being installed or updated.
pub const INSTALL_MARKERS: [&str; 4] = [
    "extracting package",
    "downloading update",
    "installing update",
    "installing palworld",
];

/// A steam client warning printed during first boot before installation proceeds.
pub const TRANSIENT_FAILURE_MARKER: &str = "steamclient.so: cannot open shared object file";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The lifecycle phase of an instance, inferred from its raw state and recent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    /// The sandbox is not running.
    Stopped,

    /// The sandbox runs but the game server shows no sign of progress yet.
    Starting,

    /// Game files are being installed or updated.
    Installing,

    /// The game server accepts players.
    Running,

    /// The output could not be read.
    Unknown,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LifecyclePhase {
    /// Returns the phase as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Installing => "installing",
            Self::Running => "running",
            Self::Unknown => "unknown",
        }
    }
}

impl Orchestrator {
    /// Infers the phase of one sandbox. Stopped sandboxes are never asked for output, and output
    /// that cannot be read yields [`LifecyclePhase::Unknown`].
    pub async fn infer_status(&self, sandbox: &SandboxSummary) -> LifecyclePhase {
        if !sandbox.is_running() {
            return LifecyclePhase::Stopped;
        }

        let tail = *self.config.get_status_tail_lines();
        match self.runtime.logs(&sandbox.id, tail).await {
            Ok(output) => infer_phase(last_lines(&output, tail)),
            Err(e) => {
                tracing::warn!(
                    "could not read output of {} for status inference: {e}",
                    sandbox.name
                );
                LifecyclePhase::Unknown
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Classifies the output of a running sandbox. The first matching rule wins:
///
/// 1. the readiness marker means [`LifecyclePhase::Running`]
/// 2. any install marker means [`LifecyclePhase::Installing`]
/// 3. the transient failure marker means [`LifecyclePhase::Installing`]
/// 4. anything else is [`LifecyclePhase::Starting`]
///
/// Markers match as ASCII case-insensitive substrings.
pub fn infer_phase(output: &str) -> LifecyclePhase {
    let output = output.to_ascii_lowercase();

    if output.contains(READINESS_MARKER) {
        LifecyclePhase::Running
    } else if INSTALL_MARKERS.iter().any(|m| output.contains(m)) {
        LifecyclePhase::Installing
    } else if output.contains(TRANSIENT_FAILURE_MARKER) {
        LifecyclePhase::Installing
    } else {
        LifecyclePhase::Starting
    }
}

/// The suffix of `output` holding its last `n` lines.
pub fn last_lines(output: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }

    let trimmed = output.trim_end_matches('\n');
    match trimmed.rmatch_indices('\n').nth(n - 1) {
        Some((index, _)) => &trimmed[index + 1..],
        None => trimmed,
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
