//! Model Registry: filesystem-backed storage for uploaded model assets.
//!
//! Uploaded bytes land under `{root}/{asset_id}/asset.bin`; an in-memory set
//! tracks which identifiers have been stored and is the single source of
//! truth for `exists`. An identifier is recorded only after its bytes are
//! fully written, so a failed upload never becomes addressable.

pub mod error;

pub use error::{RegistryError, Result};

use common::AssetId;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Canonical file name under which an asset's bytes are stored.
pub const ASSET_FILE_NAME: &str = "asset.bin";

/// Registry of uploaded model assets.
pub struct ModelRegistry {
    root: PathBuf,
    stored: DashMap<AssetId, PathBuf>,
}

impl ModelRegistry {
    /// Opens (and creates if necessary) the asset store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            stored: DashMap::new(),
        })
    }

    /// Stores uploaded bytes under a namespaced directory for `asset_id`.
    ///
    /// The identifier is recorded in the in-memory set only once the write
    /// has completed; a failed write leaves the registry unchanged.
    pub async fn store(&self, asset_id: AssetId, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(RegistryError::EmptyUpload);
        }

        let dir = self.root.join(asset_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(ASSET_FILE_NAME);
        tokio::fs::write(&path, bytes).await?;

        self.stored.insert(asset_id, path);
        info!("Stored model asset {} ({} bytes)", asset_id, bytes.len());
        Ok(())
    }

    /// Whether `asset_id` has been stored in this process's lifetime.
    pub fn exists(&self, asset_id: &AssetId) -> bool {
        self.stored.contains_key(asset_id)
    }

    /// Path of the stored bytes for `asset_id`, if it exists.
    pub fn asset_file(&self, asset_id: &AssetId) -> Option<PathBuf> {
        self.stored.get(asset_id).map(|entry| entry.value().clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ModelRegistry::new(dir.path()).expect("registry");

        let asset_id = AssetId::new();
        assert!(!registry.exists(&asset_id));

        registry.store(asset_id, b"model bytes").await.expect("store");
        assert!(registry.exists(&asset_id));

        let path = registry.asset_file(&asset_id).expect("asset file");
        assert_eq!(std::fs::read(path).expect("read back"), b"model bytes");
    }

    #[tokio::test]
    async fn empty_upload_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ModelRegistry::new(dir.path()).expect("registry");

        let asset_id = AssetId::new();
        let err = registry.store(asset_id, b"").await.unwrap_err();
        assert!(matches!(err, RegistryError::EmptyUpload));
        assert!(!registry.exists(&asset_id));
    }

    #[tokio::test]
    async fn failed_write_records_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = ModelRegistry::new(dir.path()).expect("registry");

        // A plain file where the asset directory should go makes the write fail.
        let asset_id = AssetId::new();
        std::fs::write(dir.path().join(asset_id.to_string()), b"in the way").expect("blocker");

        let result = registry.store(asset_id, b"model bytes").await;
        assert!(result.is_err());
        assert!(!registry.exists(&asset_id));
        assert!(registry.asset_file(&asset_id).is_none());
    }
}
