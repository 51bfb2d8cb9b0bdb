//! Request orchestration: drives one request through the lifecycle state
//! machine, from workspace allocation through asset swap and sequential
//! stage execution to the terminal status.

use crate::status::StatusTracker;
use crate::workspace::WorkspaceManager;
use chrono::{DateTime, Utc};
use common::{AssetId, RequestId, RequestStatus};
use dashmap::DashMap;
use motiongen_pipeline::{runner, swap, BackendSpec, StageOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// One backend plus the lock serializing its global asset slot.
///
/// The installed-asset path is backend-global, not per-request; the lock is
/// held for the full install → run → restore span so requests against the
/// same backend can never observe each other's swap.
pub struct BackendSlot {
    pub spec: BackendSpec,
    lock: Mutex<()>,
}

impl BackendSlot {
    pub fn new(spec: BackendSpec) -> Self {
        Self {
            spec,
            lock: Mutex::new(()),
        }
    }
}

/// Outcome record for one attempted stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: String,
    #[serde(flatten)]
    pub outcome: StageOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Everything the orchestrator needs for one request. Owned by the request's
/// task for its lifetime.
pub struct GenerationRequest {
    pub request_id: RequestId,
    pub description: String,
    pub durations: Vec<f64>,
    /// Custom model asset (id and stored file), if one was named.
    pub model: Option<(AssetId, PathBuf)>,
}

/// Sequences asset swap, stage execution, and status transitions for each
/// request. One instance is shared by all request tasks.
pub struct Orchestrator {
    status: Arc<StatusTracker>,
    workspaces: Arc<WorkspaceManager>,
    backends: Vec<BackendSlot>,
    reports: DashMap<RequestId, Vec<StageRecord>>,
}

impl Orchestrator {
    pub fn new(
        status: Arc<StatusTracker>,
        workspaces: Arc<WorkspaceManager>,
        backends: Vec<BackendSpec>,
    ) -> Self {
        Self {
            status,
            workspaces,
            backends: backends.into_iter().map(BackendSlot::new).collect(),
            reports: DashMap::new(),
        }
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.spec.name.clone()).collect()
    }

    /// Per-stage outcome records for a request whose stages have all been
    /// attempted.
    pub fn report(&self, request_id: &RequestId) -> Option<Vec<StageRecord>> {
        self.reports.get(request_id).map(|r| r.value().clone())
    }

    /// Runs one request to a terminal status. Stage failures never abort the
    /// remaining stages; only allocation failures (and an unrestorable asset
    /// slot) end in FAILED.
    pub async fn run_request(&self, request: GenerationRequest, cancel: CancellationToken) {
        let request_id = request.request_id;
        self.status.set(request_id, RequestStatus::GenerationStarted);

        let workspace = match self.workspaces.allocate(&request_id, &self.stage_names()) {
            Ok(dir) => dir,
            Err(e) => {
                error!("Workspace allocation failed for {}: {}", request_id, e);
                self.status.set(request_id, RequestStatus::Failed);
                return;
            }
        };

        let mut records = Vec::with_capacity(self.backends.len());
        for slot in &self.backends {
            let (record, asset_ok) = self.run_backend(slot, &request, &workspace, &cancel).await;
            records.push(record);
            if !asset_ok {
                // An unrestored asset slot would corrupt every later request
                // against this backend.
                error!(
                    "Asset slot for backend '{}' left unrestored; failing request {}",
                    slot.spec.name, request_id
                );
                self.reports.insert(request_id, records);
                self.status.set(request_id, RequestStatus::Failed);
                return;
            }
        }
        self.reports.insert(request_id, records);

        self.status.set(request_id, RequestStatus::GenerationFinished);
        self.status.set(request_id, RequestStatus::Success);
        info!("Request {} ready for download", request_id);
    }

    /// Runs one backend's stage under its asset-slot lock. Returns the stage
    /// record and whether the asset slot is in a known-good state afterwards.
    async fn run_backend(
        &self,
        slot: &BackendSlot,
        request: &GenerationRequest,
        workspace: &Path,
        cancel: &CancellationToken,
    ) -> (StageRecord, bool) {
        let backend = &slot.spec;
        let started_at = Utc::now();

        let _guard = slot.lock.lock().await;

        if let Some((asset_id, asset_file)) = &request.model {
            info!("Using custom model {} for backend '{}'", asset_id, backend.name);
            if let Err(e) = swap::install(backend, asset_file) {
                // Tolerated: the stage proceeds with whatever is installed.
                warn!("{}", e);
            }
        }

        let stage_dir = workspace.join(&backend.name);
        let outcome = match runner::run_stage(
            backend,
            &request.request_id,
            &stage_dir,
            &request.description,
            &request.durations,
            cancel,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Stage '{}' did not run: {}", backend.name, e);
                StageOutcome::Failed {
                    reason: e.to_string(),
                    exit_code: None,
                }
            }
        };

        if !outcome.is_success() {
            warn!(
                "Error during {} generation, falling back to default model",
                backend.name
            );
        }

        // Whenever a custom model was named the backend leaves this span on
        // its default asset, for both the success and the failure path.
        let mut asset_ok = true;
        if request.model.is_some() {
            if let Err(e) = swap::restore_default(backend) {
                error!("{}", e);
                asset_ok = false;
            }
        }

        let record = StageRecord {
            stage: backend.name.clone(),
            outcome,
            started_at,
            finished_at: Utc::now(),
        };
        (record, asset_ok)
    }
}
