use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Malformed transcript entry: {0}")]
    MalformedEntry(String),
    #[error("Weight store error: {0}")]
    WeightStore(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CardError>;
