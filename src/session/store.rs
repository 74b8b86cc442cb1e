use std::{
    collections::{BTreeMap, HashMap},
    io,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::Error;

/// Key-value store holding the auth token and the operator profile.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Credentials kept as a JSON object in a file readable by its owner only.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Saved entries. A file that does not parse reads as empty, so the
    /// next write replaces it.
    async fn read(&self) -> Result<BTreeMap<String, String>, Error> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(
                path = %self.path.display(),
                error = %e,
                "ignoring unreadable credentials file",
            );
            BTreeMap::new()
        }))
    }

    async fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?).await?;
        #[cfg(unix)]
        {
            use std::{fs::Permissions, os::unix::fs::PermissionsExt as _};

            fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.read().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.read().await?;
        entries.remove(key);
        self.write(&entries).await
    }
}

/// Process-local store, for embedding and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries().remove(key);
        Ok(())
    }
}
