//! Message bridge between the editor UI and its project worker.

pub mod channels;
pub mod client;
pub mod codec;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod router;
pub mod server;

pub use client::{BridgeClient, BridgeEvent, BridgeEvents};
pub use codec::{DEFAULT_MAX_FRAME_BYTES, encode_frame, read_frame, write_encoded, write_frame};
pub use error::{BridgeError, BridgeFailure};
pub use messages::*;
pub use protocol::{Frame, decode_payload, encode_payload};
pub use router::{Router, SyncHandlers};
pub use server::{EventSender, Server};
