use thiserror::Error;

/// Failure reported by a host bridge (store or remote catalog).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Remote catalog error: {0}")]
    Remote(String),

    #[error("Unknown media kind: {0}")]
    UnknownKind(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
