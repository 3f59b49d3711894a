use thiserror::Error;

use crate::ids::Collection;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid db symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("invalid {collection} entity {db_symbol}: {reason}")]
    InvalidEntity {
        collection: Collection,
        db_symbol: String,
        reason: String,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
