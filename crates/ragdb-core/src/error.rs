use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("Embedding provider failed: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
