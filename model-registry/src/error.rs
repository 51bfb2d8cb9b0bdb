use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty model upload")]
    EmptyUpload,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
