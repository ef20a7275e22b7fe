//! Key-value store implementations.
//!
//! [`FilesystemStore`] keeps each key as `<dir>/<key>.json` and writes through
//! a temp file and rename, so a crash mid-write leaves the previous document
//! intact. [`MemoryStore`] is a map behind a lock for tests.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use kaunseling_core::defaults::DOCUMENT_EXTENSION;
use kaunseling_core::{Error, KeyValueStore, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Directory-backed store.
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid storage key: {}", key)));
        }
        Ok(self
            .base_path
            .join(format!("{}.{}", key, DOCUMENT_EXTENSION)))
    }

    /// Check that the directory can be created, written, read and cleaned up.
    ///
    /// Run at startup so permission problems surface before the first edit.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", self.base_path, e))?;

        let check_file = self.base_path.join(".health-check");
        let data = b"storage-health-check";
        fs::write(&check_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", check_file, e))?;
        let read_back = fs::read(&check_file)
            .await
            .map_err(|e| format!("read({:?}): {}", check_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }
        fs::remove_file(&check_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", check_file, e))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FilesystemStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.full_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.full_path(key)?;
        debug!(subsystem = "store", storage_key = %key, size_bytes = value.len(), "Writing document");

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            warn!(subsystem = "store", dir = %self.base_path.display(), error = %e, "create_dir_all failed");
            e
        })?;

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(subsystem = "store", temp_path = %temp_path.display(), error = %e, "File::create failed");
            e
        })?;
        file.write_all(value.as_bytes()).await.map_err(|e| {
            warn!(subsystem = "store", error = %e, "write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await.map_err(|e| {
            warn!(subsystem = "store", from = %temp_path.display(), to = %path.display(), error = %e, "rename failed");
            e
        })?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.full_path(key)?;
        if fs::try_exists(&path).await? {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing documents.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
