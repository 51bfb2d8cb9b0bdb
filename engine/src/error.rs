use common::{AssetId, RequestId, RequestStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("motion description must not be empty")]
    EmptyDescription,

    #[error("unknown model asset: {0}")]
    UnknownModel(AssetId),

    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    #[error("request {0} is not ready (status: {1})")]
    NotReady(RequestId, RequestStatus),

    #[error("workspace allocation failed: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("model registry error: {0}")]
    Registry(#[from] motiongen_registry::RegistryError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
