use crate::RuntimeResult;

use super::{SandboxSpec, SandboxSummary};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The capabilities servercontrol needs from a container runtime.
///
/// Sandboxes are addressed by a handle: the full id, a unique id prefix (such as the 12-character
/// short id) or the sandbox name.
#[async_trait::async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Lists sandboxes. Stopped ones are included only when `all` is set.
    async fn list(&self, all: bool) -> RuntimeResult<Vec<SandboxSummary>>;

    /// Pulls `image` from its registry, refreshing any local copy.
    async fn pull(&self, image: &str) -> RuntimeResult<()>;

    /// Creates a sandbox without starting it and returns its id.
    async fn create(&self, spec: &SandboxSpec) -> RuntimeResult<String>;

    /// Starts a sandbox. Starting a running sandbox succeeds.
    async fn start(&self, handle: &str) -> RuntimeResult<()>;

    /// Stops a sandbox, killing it after `grace_secs`.
    ///
    /// Stopping a sandbox that is not running fails with [`RuntimeError::NotModified`].
    ///
    /// [`RuntimeError::NotModified`]: crate::RuntimeError::NotModified
    async fn stop(&self, handle: &str, grace_secs: u32) -> RuntimeResult<()>;

    /// Removes a sandbox. Without `force` a running sandbox is not removed.
    async fn remove(&self, handle: &str, force: bool) -> RuntimeResult<()>;

    /// Returns the last `tail_lines` lines of combined stdout and stderr.
    async fn logs(&self, handle: &str, tail_lines: usize) -> RuntimeResult<String>;
}
