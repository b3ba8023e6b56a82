use tracing::{info, warn};

use crate::{
    runtime::SandboxSummary, RuntimeError, RuntimeResult, ServerControlError, ServerControlResult,
};

use super::Orchestrator;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Orchestrator {
    /// Starts an instance. Starting a running instance succeeds.
    pub async fn start(&self, id: &str) -> ServerControlResult<()> {
        let start_error = |source| ServerControlError::StartError {
            id: id.to_string(),
            source,
        };

        let sandbox_id = self.resolve_instance(id).await.map_err(start_error)?;
        self.runtime.start(&sandbox_id).await.map_err(start_error)?;

        info!("started instance {id}");
        Ok(())
    }

    /// Stops an instance gracefully. Stopping a stopped instance is a [`StopError`].
    ///
    /// [`StopError`]: ServerControlError::StopError
    pub async fn stop(&self, id: &str) -> ServerControlResult<()> {
        let stop_error = |source| ServerControlError::StopError {
            id: id.to_string(),
            source,
        };

        let sandbox_id = self.resolve_instance(id).await.map_err(stop_error)?;
        self.runtime
            .stop(&sandbox_id, *self.config.get_stop_grace_secs())
            .await
            .map_err(stop_error)?;

        info!("stopped instance {id}");
        Ok(())
    }

    /// Deletes an instance: a best-effort stop, then a forced removal.
    ///
    /// Only the removal can fail the operation. Stored settings and the storage directory are
    /// kept.
    pub async fn delete(&self, id: &str) -> ServerControlResult<()> {
        let delete_error = |source| ServerControlError::DeleteError {
            id: id.to_string(),
            source,
        };

        let sandbox_id = self.resolve_instance(id).await.map_err(delete_error)?;
        if let Err(e) = self
            .runtime
            .stop(&sandbox_id, *self.config.get_delete_grace_secs())
            .await
        {
            warn!("ignoring stop failure before deleting {id}: {e}");
        }

        self.runtime
            .remove(&sandbox_id, true)
            .await
            .map_err(delete_error)?;

        info!("deleted instance {id}");
        Ok(())
    }

    /// Returns the most recent output of an instance as one text blob.
    pub async fn logs(&self, id: &str) -> ServerControlResult<String> {
        let logs_error = |source| ServerControlError::LogsUnavailable {
            id: id.to_string(),
            source,
        };

        let sandbox_id = self.resolve_instance(id).await.map_err(logs_error)?;
        self.runtime
            .logs(&sandbox_id, *self.config.get_logs_tail_lines())
            .await
            .map_err(logs_error)
    }

    /// Resolves a handle to the full id of a managed sandbox.
    ///
    /// The handle may be the full id, the sandbox name or a unique id prefix. Sandboxes outside
    /// the name prefix resolve as [`RuntimeError::NotFound`].
    async fn resolve_instance(&self, handle: &str) -> RuntimeResult<String> {
        let managed: Vec<SandboxSummary> = self
            .runtime
            .list(true)
            .await?
            .into_iter()
            .filter(|s| self.is_managed(&s.name))
            .collect();

        find_handle(&managed, handle)
            .map(|s| s.id.clone())
            .ok_or_else(|| RuntimeError::NotFound(format!("no such instance: {handle}")))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Finds the sandbox `handle` names by exact id or name, then by unique id prefix.
fn find_handle<'a>(sandboxes: &'a [SandboxSummary], handle: &str) -> Option<&'a SandboxSummary> {
    if handle.is_empty() {
        return None;
    }

    if let Some(sandbox) = sandboxes.iter().find(|s| s.id == handle || s.name == handle) {
        return Some(sandbox);
    }

    let mut matches = sandboxes.iter().filter(|s| s.id.starts_with(handle));
    match (matches.next(), matches.next()) {
        (Some(sandbox), None) => Some(sandbox),
        _ => None,
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(id: &str, name: &str) -> SandboxSummary {
        SandboxSummary {
            id: id.to_string(),
            name: name.to_string(),
            state: "running".to_string(),
            status_text: "Up".to_string(),
            ports: Vec::new(),
            image: "img".to_string(),
        }
    }

    #[test]
    fn test_find_handle() {
        let sandboxes = [
            sandbox("abc123def456aa", "palworld-server-1"),
            sandbox("abc999def456bb", "palworld-server-2"),
        ];

        let found = |handle| find_handle(&sandboxes, handle).map(|s| s.name.as_str());
        assert_eq!(found("abc123def456aa"), Some("palworld-server-1"));
        assert_eq!(found("abc123def456"), Some("palworld-server-1"));
        assert_eq!(found("palworld-server-2"), Some("palworld-server-2"));
        assert_eq!(found("abc"), None);
        assert_eq!(found(""), None);
        assert_eq!(found("postgres"), None);
    }
}
