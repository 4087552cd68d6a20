//! Durable identity storage in a local JSON file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use zerohour_core::error::DomainError;
use zerohour_core::storage::IdentityStore;

/// Keeps string values in a JSON object on disk.
///
/// A missing file reads as empty. Writes replace the file atomically by
/// renaming a sibling temporary file over it.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, DomainError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                DomainError::Storage(format!("{} is not valid: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(DomainError::Storage(format!(
                "reading {} failed: {e}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn read(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.load().await?.remove(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut values = self.load().await?;
        values.insert(key.to_owned(), value.to_owned());
        let text = serde_json::to_string_pretty(&values)
            .map_err(|e| DomainError::Storage(format!("encoding identity failed: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await.map_err(|e| {
            DomainError::Storage(format!("writing {} failed: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DomainError::Storage(format!("replacing {} failed: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), key, "identity stored");
        Ok(())
    }
}
