//! Asset Swap Controller.
//!
//! Temporarily substitutes a custom model asset at a backend's fixed install
//! path. The path is backend-global, shared by every request against that
//! backend; callers serialize the full install → run → restore span behind
//! the backend's lock. The default asset is always restorable from the
//! `*_backup` sibling, which must exist before any swap is attempted.

use crate::backend::BackendSpec;
use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing::info;

fn swap_err(backend: &BackendSpec, reason: String) -> PipelineError {
    PipelineError::Swap {
        backend: backend.name.clone(),
        reason,
    }
}

/// Creates the `*_backup` sibling from the currently installed default asset
/// if it does not exist yet. Called once at service start; precondition for
/// any later swap.
pub fn ensure_backup(backend: &BackendSpec) -> Result<()> {
    let backup = backend.backup_path();
    if backup.exists() {
        return Ok(());
    }
    std::fs::copy(&backend.asset_path, &backup).map_err(|e| {
        swap_err(
            backend,
            format!("creating backup {}: {}", backup.display(), e),
        )
    })?;
    info!(
        "Created default-asset backup for backend '{}' at {}",
        backend.name,
        backup.display()
    );
    Ok(())
}

/// Removes the active asset file at the backend's expected path and copies
/// the custom bytes in. Destructive in-place replacement.
pub fn install(backend: &BackendSpec, asset_file: &Path) -> Result<()> {
    if !backend.backup_path().exists() {
        return Err(swap_err(backend, "no default-asset backup present".to_string()));
    }
    if backend.asset_path.exists() {
        std::fs::remove_file(&backend.asset_path)
            .map_err(|e| swap_err(backend, format!("removing active asset: {}", e)))?;
    }
    std::fs::copy(asset_file, &backend.asset_path).map_err(|e| {
        swap_err(
            backend,
            format!("installing {}: {}", asset_file.display(), e),
        )
    })?;
    info!(
        "Installed custom asset at {} for backend '{}'",
        backend.asset_path.display(),
        backend.name
    );
    Ok(())
}

/// Copies the backup back over the expected path, putting the backend back
/// on its default asset.
pub fn restore_default(backend: &BackendSpec) -> Result<()> {
    let backup = backend.backup_path();
    if backend.asset_path.exists() {
        std::fs::remove_file(&backend.asset_path)
            .map_err(|e| swap_err(backend, format!("removing active asset: {}", e)))?;
    }
    std::fs::copy(&backup, &backend.asset_path)
        .map_err(|e| swap_err(backend, format!("restoring default: {}", e)))?;
    info!("Restored default asset for backend '{}'", backend.name);
    Ok(())
}
