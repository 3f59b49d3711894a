use studio_bridge::BridgeError;
use studio_core::{Collection, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller broke an operation's contract. Raised before any state change.
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("invalid {collection} entity {db_symbol}: {reason}")]
    Validation {
        collection: Collection,
        db_symbol: String,
        reason: String,
    },

    #[error("entity bound to {actual} cannot be written to {expected}")]
    CollectionMismatch {
        expected: Collection,
        actual: Collection,
    },
}

impl EngineError {
    /// Load-time schema failures surface as [`EngineError::Validation`]
    /// rather than a generic core error.
    pub(crate) fn from_validation(e: CoreError) -> Self {
        match e {
            CoreError::InvalidEntity {
                collection,
                db_symbol,
                reason,
            } => Self::Validation {
                collection,
                db_symbol,
                reason,
            },
            other => Self::Core(other),
        }
    }
}
