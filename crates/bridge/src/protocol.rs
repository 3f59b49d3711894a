use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use studio_core::RequestId;

use crate::error::{BridgeError, BridgeFailure};

/// Unit of traffic between the UI and the worker.
///
/// Commands have no correlation and no reply. Requests carry an id that the
/// matching response echoes back. Events flow from the worker to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    Command {
        channel: String,
        payload: Vec<u8>,
    },
    Request {
        id: RequestId,
        channel: String,
        payload: Vec<u8>,
    },
    Response {
        id: RequestId,
        result: Result<Vec<u8>, BridgeFailure>,
    },
    Event {
        channel: String,
        payload: Vec<u8>,
    },
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Request { .. } => "request",
            Self::Response { .. } => "response",
            Self::Event { .. } => "event",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, BridgeError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BridgeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

pub fn encode_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, BridgeError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BridgeError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
