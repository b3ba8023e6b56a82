use std::{
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

use crate::{ServerControlError, ServerControlResult};

use super::Settings;

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Persists instance settings keyed by short instance id.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the settings of an instance, or the defaults if none were written.
    async fn read(&self, instance_id: &str) -> ServerControlResult<Settings>;

    /// Replaces the settings of an instance.
    async fn write(&self, instance_id: &str, settings: &Settings) -> ServerControlResult<()>;
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`SettingsStore`] keeping one JSON file per instance in a directory.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileSettingsStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, instance_id: &str) -> ServerControlResult<PathBuf> {
        validate_instance_id(instance_id)?;
        Ok(self.dir.join(format!("{instance_id}.json")))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Checks that an instance id is safe to use as a storage key: `[A-Za-z0-9_-]+`.
pub fn validate_instance_id(instance_id: &str) -> ServerControlResult<()> {
    let valid = !instance_id.is_empty()
        && instance_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if !valid {
        return Err(ServerControlError::InvalidArgument(format!(
            "invalid instance id: {instance_id:?}"
        )));
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn read(&self, instance_id: &str) -> ServerControlResult<Settings> {
        let path = self.path_for(instance_id)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no settings stored for {instance_id}, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map_err(|e| {
            ServerControlError::Settings(format!(
                "corrupt settings file {}: {e}",
                path.display()
            ))
        })
    }

    async fn write(&self, instance_id: &str, settings: &Settings) -> ServerControlResult<()> {
        let path = self.path_for(instance_id)?;
        let contents = serde_json::to_vec_pretty(settings)?;
        fs::create_dir_all(&self.dir).await?;

        // Each write gets its own temp file, then renames over the target, so readers never
        // observe a partial file and concurrent writers never share one.
        let dir = self.dir.clone();
        let prefix = format!(".{instance_id}.");
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> ServerControlResult<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".json.tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&contents)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(ServerControlError::custom)??;

        tracing::debug!("wrote settings for {instance_id} to {}", path.display());
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_instance_id() {
        assert!(validate_instance_id("4f1c2d3e4b5a").is_ok());
        assert!(validate_instance_id("my_server-1").is_ok());
        assert!(validate_instance_id("").is_err());
        assert!(validate_instance_id("../etc").is_err());
        assert!(validate_instance_id("a/b").is_err());
        assert!(validate_instance_id("a b").is_err());
    }

    #[tokio::test]
    async fn test_file_store_concurrent_writes_to_one_instance() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileSettingsStore::new(dir.path());

        let writes = (1..=16).map(|players| {
            let store = store.clone();
            async move {
                let settings = Settings {
                    max_players: players,
                    ..Settings::default()
                };
                store.write("abc", &settings).await
            }
        });
        for result in futures::future::join_all(writes).await {
            result?;
        }

        let stored = store.read("abc").await?;
        assert!((1..=16).contains(&stored.max_players));

        // Only the settings file remains, no temp files
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["abc.json".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileSettingsStore::new(dir.path());
        tokio::fs::write(dir.path().join("abc.json"), "{not json").await?;

        assert!(matches!(
            store.read("abc").await,
            Err(ServerControlError::Settings(_))
        ));
        Ok(())
    }
}
