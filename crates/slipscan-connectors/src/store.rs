//! Filesystem slip store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use slipscan_core::models::config::StorageConfig;
use slipscan_core::relay::sanitize_filename;
use slipscan_core::{SlipStore, StorageError, StoredSlip};

/// Writes slip images into a directory served under a public URL prefix.
pub struct LocalSlipStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalSlipStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` when no storage directory is configured.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        config
            .dir
            .as_ref()
            .map(|dir| Self::new(dir, config.public_base_url.clone()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SlipStore for LocalSlipStore {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredSlip, StorageError> {
        let name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(filename));
        let write_error = |e: std::io::Error| StorageError::Write {
            name: name.clone(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_error)?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes).await.map_err(write_error)?;
        debug!("Wrote {} ({}, {} bytes)", path.display(), content_type, bytes.len());

        Ok(StoredSlip {
            url: format!("{}/{}", self.public_base_url, name),
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlipStore::new(dir.path().join("slips"), "https://cdn.example/slips/");

        let stored = store.put("my slip.jpg", "image/jpeg", b"jpeg").await.unwrap();

        assert!(stored.name.ends_with("_my_slip.jpg"));
        assert_eq!(stored.url, format!("https://cdn.example/slips/{}", stored.name));
        let written = std::fs::read(dir.path().join("slips").join(&stored.name)).unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSlipStore::new(dir.path(), "http://localhost/slips");

        let a = store.put("slip.jpg", "image/jpeg", b"a").await.unwrap();
        let b = store.put("slip.jpg", "image/jpeg", b"b").await.unwrap();

        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_from_config_requires_dir() {
        assert!(LocalSlipStore::from_config(&StorageConfig::default()).is_none());
    }
}
