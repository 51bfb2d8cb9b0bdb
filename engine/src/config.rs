//! Engine configuration.

use anyhow::Context;
use motiongen_pipeline::BackendSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for engine initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root under which per-request workspaces are allocated.
    pub output_root: PathBuf,

    /// Root of the uploaded model-asset store.
    pub model_store_root: PathBuf,

    /// Generation back-ends, run in declared order for every request.
    #[serde(default)]
    pub backends: Vec<BackendSpec>,
}

impl EngineConfig {
    /// A configuration rooted in the current working directory with no
    /// back-ends configured.
    pub fn default_paths() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            model_store_root: PathBuf::from("model_store"),
            backends: Vec::new(),
        }
    }

    /// Loads the configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_backend_from_toml() {
        let text = r#"
            output_root = "/srv/motiongen/output"
            model_store_root = "/srv/motiongen/model_store"

            [[backends]]
            name = "teach"
            program = "/opt/teach/venv/bin/python"
            script = "interact_teach.py"
            work_dir = "/opt/teach"
            checkpoint = "../baseline/17l8a1tq"
            asset_path = "/opt/teach/data/smpl/SMPL_MALE.pkl"
            prompt_style = "segmented"

            [[backends]]
            name = "t2m"
            program = "/opt/t2m/conda/bin/python"
            script = "run_t2m.py"
            work_dir = "/opt/t2m"
            asset_path = "/opt/t2m/body_models/smpl/SMPL_NEUTRAL.pkl"
            prompt_style = "single_prompt"
            render_script = "render_final.py"
        "#;

        let config: EngineConfig = toml::from_str(text).expect("parse");
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].name, "teach");
        assert_eq!(
            config.backends[0].checkpoint.as_deref(),
            Some("../baseline/17l8a1tq")
        );
        assert!(config.backends[1].render_script.is_some());
        assert!(config.backends[1].checkpoint.is_none());
    }
}
