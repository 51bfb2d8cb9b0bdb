//! Backend descriptions.
//!
//! A backend is one named external generation system: an executable, a fixed
//! working directory, an argument contract, and the fixed path at which its
//! model asset is installed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Argument contract a backend's generation script expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// `texts=[...]` and `durs=[...]` keyword arguments, one entry per
    /// motion segment.
    Segmented,
    /// One positional prompt; segment separators are rewritten to " then ".
    SinglePrompt,
}

/// One named external generation system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Stage name, also used for workspace subdirectories and output naming.
    pub name: String,

    /// Interpreter or executable that runs the generation script.
    pub program: PathBuf,

    /// Generation script passed as the first argument to `program`.
    pub script: String,

    /// Fixed working directory for the subprocess.
    pub work_dir: PathBuf,

    /// Source experiment / checkpoint folder forwarded to the script.
    #[serde(default)]
    pub checkpoint: Option<String>,

    /// Fixed expected path of the currently installed model asset.
    pub asset_path: PathBuf,

    /// How the motion description and durations are rendered into arguments.
    pub prompt_style: PromptStyle,

    /// Dependent render script run after the primary step succeeds.
    #[serde(default)]
    pub render_script: Option<String>,
}

impl BackendSpec {
    /// `*_backup` sibling of the installed asset file, used for restoration.
    pub fn backup_path(&self) -> PathBuf {
        let stem = self
            .asset_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset");
        let file_name = match self.asset_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_backup.{ext}"),
            None => format!("{stem}_backup"),
        };
        self.asset_path.with_file_name(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_asset(path: &str) -> BackendSpec {
        BackendSpec {
            name: "teach".to_string(),
            program: PathBuf::from("/usr/bin/python3"),
            script: "interact.py".to_string(),
            work_dir: PathBuf::from("/opt/teach"),
            checkpoint: None,
            asset_path: PathBuf::from(path),
            prompt_style: PromptStyle::Segmented,
            render_script: None,
        }
    }

    #[test]
    fn backup_path_keeps_extension() {
        let spec = spec_with_asset("/models/smpl/SMPL_MALE.pkl");
        assert_eq!(
            spec.backup_path(),
            PathBuf::from("/models/smpl/SMPL_MALE_backup.pkl")
        );
    }

    #[test]
    fn backup_path_without_extension() {
        let spec = spec_with_asset("/models/smpl/neutral");
        assert_eq!(spec.backup_path(), PathBuf::from("/models/smpl/neutral_backup"));
    }
}
