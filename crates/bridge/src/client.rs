use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};

use studio_core::RequestId;

use crate::codec::{DEFAULT_MAX_FRAME_BYTES, encode_frame, read_frame, write_encoded};
use crate::error::{BridgeError, BridgeFailure};
use crate::protocol::{Frame, decode_payload, encode_payload};
use crate::router::SyncHandlers;

type Reply = oneshot::Sender<Result<Vec<u8>, BridgeFailure>>;

/// `None` once the connection is gone, so late requests fail fast instead
/// of waiting on a reply that can never arrive.
type Pending = Arc<Mutex<Option<HashMap<RequestId, Reply>>>>;

/// Event pushed by the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeEvent {
    pub channel: String,
    pub payload: Vec<u8>,
}

impl BridgeEvent {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        decode_payload(&self.payload)
    }
}

pub struct BridgeEvents {
    rx: mpsc::UnboundedReceiver<BridgeEvent>,
}

impl BridgeEvents {
    /// Next event, or `None` after the worker hung up.
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        self.rx.recv().await
    }
}

/// UI-side handle on the worker. Cloning is cheap; all clones share one
/// connection.
#[derive(Clone)]
pub struct BridgeClient {
    /// Encoded frames; size limits are checked before anything is queued.
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    pending: Pending,
    sync: SyncHandlers,
    max_frame_bytes: usize,
}

impl BridgeClient {
    /// Start the reader and writer tasks over the given stream halves.
    /// Must be called from within a tokio runtime.
    pub fn connect<R, W>(reader: R, writer: W, sync: SyncHandlers) -> (Self, BridgeEvents)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::connect_with_limit(reader, writer, sync, DEFAULT_MAX_FRAME_BYTES)
    }

    pub fn connect_with_limit<R, W>(
        mut reader: R,
        mut writer: W,
        sync: SyncHandlers,
        max_frame_bytes: usize,
    ) -> (Self, BridgeEvents)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));

        let writer_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(bytes) = outbound_rx.recv().await {
                if let Err(e) = write_encoded(&mut writer, &bytes).await {
                    tracing::error!(error = %e, "bridge write failed");
                    break;
                }
            }
            // Nothing more reaches the worker: fail every waiter and close
            // the queue so later calls see the disconnect.
            writer_pending.lock().take();
            outbound_rx.close();
        });

        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            loop {
                match read_frame(&mut reader, max_frame_bytes).await {
                    Ok(Some(Frame::Response { id, result })) => {
                        let reply = reader_pending
                            .lock()
                            .as_mut()
                            .and_then(|map| map.remove(&id));
                        match reply {
                            // The caller may have given up; nothing to do then.
                            Some(reply) => {
                                let _ = reply.send(result);
                            }
                            None => tracing::warn!(%id, "response for unknown request"),
                        }
                    }
                    Ok(Some(Frame::Event { channel, payload })) => {
                        let _ = events_tx.send(BridgeEvent { channel, payload });
                    }
                    Ok(Some(other)) => {
                        tracing::warn!(kind = other.kind(), "unexpected frame from worker");
                    }
                    Ok(None) => {
                        tracing::debug!("worker closed the bridge");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "bridge read failed");
                        break;
                    }
                }
            }
            // Dropping the reply senders resolves every waiter as disconnected.
            reader_pending.lock().take();
        });

        let client = Self {
            outbound,
            pending,
            sync,
            max_frame_bytes,
        };
        (client, BridgeEvents { rx: events_rx })
    }

    /// Fire-and-forget: no reply, no delivery confirmation.
    pub fn emit<T: Serialize + ?Sized>(&self, channel: &str, payload: &T) -> Result<(), BridgeError> {
        let frame = Frame::Command {
            channel: channel.to_string(),
            payload: encode_payload(payload)?,
        };
        let bytes = encode_frame(&frame, self.max_frame_bytes)?;
        self.outbound
            .send(bytes)
            .map_err(|_| BridgeError::Disconnected)
    }

    /// Send a request and wait for the response carrying the same id.
    pub async fn request<T, R>(&self, channel: &str, payload: &T) -> Result<R, BridgeError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = RequestId::new();
        let frame = Frame::Request {
            id,
            channel: channel.to_string(),
            payload: encode_payload(payload)?,
        };
        let bytes = encode_frame(&frame, self.max_frame_bytes)?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            let map = pending.as_mut().ok_or(BridgeError::Disconnected)?;
            map.insert(id, tx);
        }
        if self.outbound.send(bytes).is_err() {
            if let Some(map) = self.pending.lock().as_mut() {
                map.remove(&id);
            }
            return Err(BridgeError::Disconnected);
        }

        tracing::trace!(%id, channel, "request sent");
        let bytes = rx.await.map_err(|_| BridgeError::Disconnected)??;
        decode_payload(&bytes)
    }

    /// Answer a synchronous query on the calling thread, without a round
    /// trip through the worker.
    pub fn query_sync<T, R>(&self, channel: &str, payload: &T) -> Result<R, BridgeError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let bytes = self.sync.call(channel, &encode_payload(payload)?)?;
        decode_payload(&bytes)
    }

    /// Requests still waiting for their response.
    pub fn in_flight(&self) -> usize {
        self.pending.lock().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_connected(&self) -> bool {
        self.pending.lock().is_some() && !self.outbound.is_closed()
    }
}
