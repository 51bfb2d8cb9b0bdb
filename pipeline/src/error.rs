use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn stage '{stage}': {source}")]
    Spawn {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset swap failed for backend '{backend}': {reason}")]
    Swap { backend: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
