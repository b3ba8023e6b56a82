use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{ServerControlError, ServerControlResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The game server inside the sandbox runs as an unrelated uid and must be able to write here.
const STORAGE_MODE: u32 = 0o777;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates `<data_dir>/<name>` and makes both directories world-writable.
pub async fn prepare_storage_dir(data_dir: &Path, name: &str) -> ServerControlResult<PathBuf> {
    let dir = data_dir.join(name);

    fs::create_dir_all(&dir)
        .await
        .map_err(|source| storage_error(&dir, source))?;
    make_world_writable(data_dir).await?;
    make_world_writable(&dir).await?;

    tracing::debug!("prepared storage directory {}", dir.display());
    Ok(dir)
}

#[cfg(unix)]
async fn make_world_writable(path: &Path) -> ServerControlResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(STORAGE_MODE))
        .await
        .map_err(|source| storage_error(path, source))
}

#[cfg(not(unix))]
async fn make_world_writable(_path: &Path) -> ServerControlResult<()> {
    let _ = STORAGE_MODE;
    Ok(())
}

fn storage_error(path: &Path, source: std::io::Error) -> ServerControlError {
    ServerControlError::StorageError {
        path: path.to_path_buf(),
        source,
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prepare_storage_dir() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let data_dir = root.path().join("palworld-servers");

        let dir = prepare_storage_dir(&data_dir, "palworld-server-1").await?;
        assert_eq!(dir, data_dir.join("palworld-server-1"));
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir)?.permissions().mode() & 0o777;
            assert_eq!(mode, 0o777);
        }

        // Preparing again is harmless.
        prepare_storage_dir(&data_dir, "palworld-server-1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_prepare_storage_dir_fails_under_a_file() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"x")?;

        let result = prepare_storage_dir(&blocker, "palworld-server-1").await;
        assert!(matches!(
            result,
            Err(ServerControlError::StorageError { .. })
        ));
        Ok(())
    }
}
