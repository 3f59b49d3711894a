use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a worker-side handler, carried back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{error_message}")]
pub struct BridgeFailure {
    pub error_message: String,
}

impl BridgeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("worker failed: {0}")]
    Failure(#[from] BridgeFailure),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bridge disconnected")]
    Disconnected,

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}

impl From<rmp_serde::encode::Error> for BridgeError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for BridgeError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
