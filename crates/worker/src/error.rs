use studio_bridge::BridgeError;
use studio_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("path outside the project: {0}")]
    InvalidPath(String),

    #[error("record stored as {expected} declares dbSymbol {found}")]
    SymbolMismatch { expected: String, found: String },
}
