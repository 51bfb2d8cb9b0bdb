//! HTTP route handlers delegating to the engine facade.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{AssetId, RequestId, RequestStatus};
use motiongen_engine::{Engine, EngineError, StageRecord};
use motiongen_registry::RegistryError;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/upload_model", post(upload_model))
        .route("/generate", get(generate))
        .route("/status/{request_id}", get(status))
        .route("/download/{request_id}", get(download))
        .route("/report/{request_id}", get(report))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// Client-visible error with the matching HTTP status.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::EmptyDescription | EngineError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            EngineError::Registry(RegistryError::EmptyUpload) => StatusCode::BAD_REQUEST,
            EngineError::RequestNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::NotReady(..) => StatusCode::TOO_EARLY,
            EngineError::Workspace(_) | EngineError::Registry(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "detail": self.1 }))).into_response()
    }
}

async fn alive() -> &'static str {
    "Service is living the dream and hopefully doing well"
}

async fn upload_model(
    State(engine): State<Engine>,
    body: Bytes,
) -> Result<Json<AssetId>, ApiError> {
    let asset_id = engine.upload(&body).await?;
    Ok(Json(asset_id))
}

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub motion_description: String,
    /// Comma-separated per-segment durations in seconds.
    pub durs: Option<String>,
    pub model_id: Option<AssetId>,
}

async fn generate(
    State(engine): State<Engine>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<RequestId>, ApiError> {
    let durations = match params.durs.as_deref() {
        Some(raw) => parse_durations(raw)?,
        None => Vec::new(),
    };
    let request_id = engine.submit(&params.motion_description, durations, params.model_id)?;
    Ok(Json(request_id))
}

fn parse_durations(raw: &str) -> Result<Vec<f64>, ApiError> {
    raw.split(',')
        .map(|piece| {
            let piece = piece.trim();
            let duration: f64 = piece.parse().map_err(|e| {
                ApiError(StatusCode::BAD_REQUEST, format!("bad duration '{piece}': {e}"))
            })?;
            if duration <= 0.0 {
                return Err(ApiError(
                    StatusCode::BAD_REQUEST,
                    format!("duration must be positive, got {piece}"),
                ));
            }
            Ok(duration)
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: RequestStatus,
    pub detail: String,
}

async fn status(
    State(engine): State<Engine>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = engine
        .poll_status(&request_id)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("request not found: {request_id}")))?;
    Ok(Json(StatusResponse {
        status,
        detail: status.to_string(),
    }))
}

/// Reports the artifact location for a finished request. Packaging the
/// directory for transfer is the deployment's concern.
async fn download(
    State(engine): State<Engine>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let artifact_dir = engine.retrieve(&request_id)?;
    Ok(Json(serde_json::json!({
        "request_id": request_id,
        "artifact_dir": artifact_dir,
    })))
}

async fn report(
    State(engine): State<Engine>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<Vec<StageRecord>>, ApiError> {
    let report = engine.stage_report(&request_id).ok_or_else(|| {
        ApiError(
            StatusCode::NOT_FOUND,
            format!("no stage report for request: {request_id}"),
        )
    })?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_and_validate() {
        assert_eq!(parse_durations("1.5, 2,3.0").expect("parse"), vec![1.5, 2.0, 3.0]);
        assert!(parse_durations("1.5,abc").is_err());
        assert!(parse_durations("0").is_err());
        assert!(parse_durations("-2").is_err());
    }
}
