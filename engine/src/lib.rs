//! MotionGen engine: request lifecycle and generation orchestration.
//!
//! The [`Engine`] is the facade a transport layer talks to: it accepts
//! generation requests, spawns one orchestration task per request, tracks
//! lifecycle status for polling, and exposes finished artifacts for
//! retrieval. Submitting never blocks on generation; callers get the request
//! identifier immediately and poll separately.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod status;
pub mod workspace;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use orchestrator::{GenerationRequest, Orchestrator, StageRecord};
pub use status::StatusTracker;
pub use workspace::WorkspaceManager;

use anyhow::Context;
use common::{AssetId, RequestId, RequestStatus};
use dashmap::DashMap;
use motiongen_pipeline::swap;
use motiongen_registry::ModelRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Central service facade.
///
/// Cloning is cheap; all state is shared behind `Arc`s.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<ModelRegistry>,
    orchestrator: Arc<Orchestrator>,
    status: Arc<StatusTracker>,
    workspaces: Arc<WorkspaceManager>,
    /// Cancellation token per in-flight request.
    cancel_tokens: Arc<DashMap<RequestId, CancellationToken>>,
}

impl Engine {
    /// Initializes the engine: opens the model store and output root, and
    /// creates each backend's default-asset backup if it is missing.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        info!("Initializing engine...");

        let registry = Arc::new(
            ModelRegistry::new(&config.model_store_root).context("opening model store")?,
        );
        let workspaces =
            Arc::new(WorkspaceManager::new(&config.output_root).context("opening output root")?);
        let status = Arc::new(StatusTracker::new());

        for backend in &config.backends {
            swap::ensure_backup(backend).with_context(|| {
                format!("creating default-asset backup for backend '{}'", backend.name)
            })?;
        }

        let orchestrator = Arc::new(Orchestrator::new(
            status.clone(),
            workspaces.clone(),
            config.backends,
        ));

        Ok(Self {
            registry,
            orchestrator,
            status,
            workspaces,
            cancel_tokens: Arc::new(DashMap::new()),
        })
    }

    /// Stores uploaded model bytes and returns the minted asset identifier.
    pub async fn upload(&self, bytes: &[u8]) -> Result<AssetId> {
        let asset_id = AssetId::new();
        self.registry.store(asset_id, bytes).await?;
        Ok(asset_id)
    }

    /// Validates and submits a generation request.
    ///
    /// Validation happens before any resource allocation: an empty
    /// description or an unknown model identifier is rejected and the
    /// request never enters the managed set. On acceptance the request is
    /// recorded as REQUEST_RECEIVED and its orchestration is spawned as an
    /// independent task; the call returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        description: &str,
        durations: Vec<f64>,
        model_id: Option<AssetId>,
    ) -> Result<RequestId> {
        if description.trim().is_empty() {
            return Err(EngineError::EmptyDescription);
        }
        let model = match model_id {
            Some(id) => {
                let file = self
                    .registry
                    .asset_file(&id)
                    .ok_or(EngineError::UnknownModel(id))?;
                Some((id, file))
            }
            None => None,
        };

        // Underscores arrive in place of spaces from URL-encoded callers.
        let description = description.replace('_', " ");

        let request_id = RequestId::new();
        self.status.set(request_id, RequestStatus::RequestReceived);

        let cancel = CancellationToken::new();
        self.cancel_tokens.insert(request_id, cancel.clone());

        let request = GenerationRequest {
            request_id,
            description,
            durations,
            model,
        };
        let orchestrator = self.orchestrator.clone();
        let tokens = self.cancel_tokens.clone();
        tokio::spawn(async move {
            orchestrator.run_request(request, cancel).await;
            tokens.remove(&request_id);
        });

        info!("Accepted generation request {}", request_id);
        Ok(request_id)
    }

    /// Current lifecycle status of a request, if known.
    pub fn poll_status(&self, request_id: &RequestId) -> Option<RequestStatus> {
        self.status.get(request_id)
    }

    /// Cancels the stage currently executing for a request, if any. Already
    /// finished stages are unaffected; there is no cooperative rollback.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        match self.cancel_tokens.get(request_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Workspace root of a finished request, gated on SUCCESS.
    pub fn retrieve(&self, request_id: &RequestId) -> Result<PathBuf> {
        match self.status.get(request_id) {
            None => Err(EngineError::RequestNotFound(*request_id)),
            Some(RequestStatus::Success) => Ok(self.workspaces.request_dir(request_id)),
            Some(status) => Err(EngineError::NotReady(*request_id, status)),
        }
    }

    /// Per-stage outcome records for a request whose pipeline has run.
    ///
    /// SUCCESS means the pipeline ran to completion, not that every stage
    /// produced usable output; this report is how callers tell the
    /// difference.
    pub fn stage_report(&self, request_id: &RequestId) -> Option<Vec<StageRecord>> {
        self.orchestrator.report(request_id)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}
