use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Extractor error: {0}")]
    ExtractError(#[from] override_extractor::ExtractError),

    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),
}
