//! Workspace Manager: per-request output directory allocation.

use crate::error::Result;
use common::RequestId;
use std::path::{Path, PathBuf};
use tracing::info;

/// Allocates per-request directory trees under a fixed output root.
pub struct WorkspaceManager {
    output_root: PathBuf,
}

impl WorkspaceManager {
    /// Opens (and creates if necessary) the output root.
    pub fn new(output_root: impl Into<PathBuf>) -> Result<Self> {
        let output_root = output_root.into();
        std::fs::create_dir_all(&output_root)?;
        Ok(Self { output_root })
    }

    /// Creates `{output_root}/{request_id}/` with one subdirectory per stage.
    ///
    /// The request directory must not already exist; workspaces are never
    /// reused across requests. Failure here is fatal for the request; every
    /// later stage's output location would be undefined.
    pub fn allocate(&self, request_id: &RequestId, stage_names: &[String]) -> Result<PathBuf> {
        let root = self.output_root.join(request_id.to_string());
        std::fs::create_dir(&root)?;
        for stage in stage_names {
            std::fs::create_dir_all(root.join(stage))?;
        }
        info!("Allocated workspace {}", root.display());
        Ok(root)
    }

    /// Path a request's workspace occupies (whether or not it exists).
    pub fn request_dir(&self, request_id: &RequestId) -> PathBuf {
        self.output_root.join(request_id.to_string())
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_stage_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = WorkspaceManager::new(dir.path()).expect("manager");

        let id = RequestId::new();
        let stages = vec!["teach".to_string(), "t2m".to_string()];
        let root = manager.allocate(&id, &stages).expect("allocate");

        assert!(root.join("teach").is_dir());
        assert!(root.join("t2m").is_dir());
    }

    #[test]
    fn existing_workspace_is_a_fatal_collision() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = WorkspaceManager::new(dir.path()).expect("manager");

        let id = RequestId::new();
        manager.allocate(&id, &[]).expect("first allocation");
        assert!(manager.allocate(&id, &[]).is_err());
    }
}
