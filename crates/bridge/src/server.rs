use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use studio_core::RequestId;

use crate::codec::{DEFAULT_MAX_FRAME_BYTES, encode_frame, read_frame, write_encoded};
use crate::error::{BridgeError, BridgeFailure};
use crate::protocol::{Frame, encode_payload};
use crate::router::Router;

/// Lets worker code push events to the UI while the server runs.
#[derive(Clone)]
pub struct EventSender {
    outbound: mpsc::UnboundedSender<Frame>,
}

impl EventSender {
    pub fn send<T: Serialize + ?Sized>(&self, channel: &str, payload: &T) -> Result<(), BridgeError> {
        let frame = Frame::Event {
            channel: channel.to_string(),
            payload: encode_payload(payload)?,
        };
        self.outbound
            .send(frame)
            .map_err(|_| BridgeError::Disconnected)
    }
}

/// Worker side of the bridge.
///
/// Each request runs on its own task, so a slow request never holds up
/// another. Commands are queued per channel and run strictly in arrival
/// order within that channel.
pub struct Server {
    router: Arc<Router>,
    outbound: mpsc::UnboundedSender<Frame>,
    outbound_rx: mpsc::UnboundedReceiver<Frame>,
    max_frame_bytes: usize,
}

impl Server {
    pub fn new(router: Router) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        Self {
            router: Arc::new(router),
            outbound,
            outbound_rx,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn events(&self) -> EventSender {
        EventSender {
            outbound: self.outbound.clone(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Serve until the UI closes its end of the stream.
    pub async fn serve<R, W>(self, mut reader: R, mut writer: W) -> Result<(), BridgeError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Server {
            router,
            outbound,
            mut outbound_rx,
            max_frame_bytes,
        } = self;

        let writer_task = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let Some(bytes) = encode_outgoing(frame, max_frame_bytes) else {
                    continue;
                };
                if let Err(e) = write_encoded(&mut writer, &bytes).await {
                    tracing::error!(error = %e, "bridge write failed");
                    break;
                }
            }
        });

        let sync = router.sync_handlers();
        let mut queues: HashMap<String, mpsc::UnboundedSender<Vec<u8>>> = HashMap::new();

        let result = loop {
            let frame = match read_frame(&mut reader, max_frame_bytes).await {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            match frame {
                Frame::Request {
                    id,
                    channel,
                    payload,
                } => {
                    if let Some(handler) = router.request_handler(&channel) {
                        let outbound = outbound.clone();
                        tokio::spawn(async move {
                            let result = handler(payload).await;
                            if let Err(failure) = &result {
                                tracing::warn!(%id, %channel, error = %failure, "request failed");
                            }
                            let _ = outbound.send(Frame::Response { id, result });
                        });
                    } else if sync.contains(&channel) {
                        let result = sync.call(&channel, &payload).map_err(to_failure);
                        let _ = outbound.send(Frame::Response { id, result });
                    } else {
                        tracing::warn!(%id, %channel, "request on unknown channel");
                        respond_unknown(&outbound, id, &channel);
                    }
                }
                Frame::Command { channel, payload } => {
                    let queue = match queues.get(&channel) {
                        Some(queue) => queue.clone(),
                        None => match spawn_command_queue(&router, &channel) {
                            Some(queue) => {
                                queues.insert(channel.clone(), queue.clone());
                                queue
                            }
                            None => {
                                tracing::warn!(%channel, "command on unknown channel");
                                continue;
                            }
                        },
                    };
                    let _ = queue.send(payload);
                }
                other => tracing::warn!(kind = other.kind(), "unexpected frame from UI"),
            }
        };

        drop(queues);
        writer_task.abort();
        tracing::info!("bridge closed");
        result
    }
}

/// Encode a frame for the UI. A response over the size limit is replaced by
/// a failure for the same request, so the caller still gets exactly one
/// answer; an oversized event is dropped.
fn encode_outgoing(frame: Frame, max_frame_bytes: usize) -> Option<Vec<u8>> {
    let e = match encode_frame(&frame, max_frame_bytes) {
        Ok(bytes) => return Some(bytes),
        Err(e) => e,
    };
    match frame {
        Frame::Response { id, .. } => {
            tracing::warn!(%id, error = %e, "response not deliverable");
            let failure = Frame::Response {
                id,
                result: Err(BridgeFailure::new(format!("response not deliverable: {e}"))),
            };
            match encode_frame(&failure, max_frame_bytes) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::error!(%id, error = %e, "failure response not deliverable");
                    None
                }
            }
        }
        other => {
            tracing::warn!(kind = other.kind(), error = %e, "dropping outgoing frame");
            None
        }
    }
}

fn to_failure(e: BridgeError) -> BridgeFailure {
    match e {
        BridgeError::Failure(failure) => failure,
        other => BridgeFailure::new(other.to_string()),
    }
}

fn respond_unknown(outbound: &mpsc::UnboundedSender<Frame>, id: RequestId, channel: &str) {
    let failure = to_failure(BridgeError::UnknownChannel(channel.to_string()));
    let _ = outbound.send(Frame::Response {
        id,
        result: Err(failure),
    });
}

fn spawn_command_queue(router: &Router, channel: &str) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
    let handlers = router.command_handlers(channel)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            for handler in &handlers {
                handler(payload.clone()).await;
            }
        }
    });
    Some(tx)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::client::BridgeClient;

    fn connect(router: Router) -> (BridgeClient, crate::client::BridgeEvents, EventSender) {
        let (ui, worker) = tokio::io::duplex(64 * 1024);
        let (ui_read, ui_write) = tokio::io::split(ui);
        let (worker_read, worker_write) = tokio::io::split(worker);
        let sync = router.sync_handlers();
        let server = Server::new(router);
        let events = server.events();
        tokio::spawn(server.serve(worker_read, worker_write));
        let (client, ui_events) = BridgeClient::connect(ui_read, ui_write, sync);
        (client, ui_events, events)
    }

    #[tokio::test]
    async fn responses_match_their_requests() {
        let mut router = Router::new();
        router.handle("slow-echo", |(delay_ms, value): (u64, String)| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, String>(value)
        });
        let (client, _events, _) = connect(router);

        let slow_args = (50u64, "slow".to_string());
        let fast_args = (0u64, "fast".to_string());
        let slow = client.request::<_, String>("slow-echo", &slow_args);
        let fast = client.request::<_, String>("slow-echo", &fast_args);
        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow.unwrap(), "slow");
        assert_eq!(fast.unwrap(), "fast");
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test]
    async fn handler_failure_reaches_caller() {
        let mut router = Router::new();
        router.handle("save", |_: String| async { Err::<(), _>("disk full") });
        let (client, _events, _) = connect(router);

        match client.request::<_, ()>("save", "x").await {
            Err(BridgeError::Failure(f)) => assert_eq!(f.error_message, "disk full"),
            other => panic!("expected failure, got {other:?}"),
        }
        match client.request::<_, ()>("nowhere", "x").await {
            Err(BridgeError::Failure(f)) => assert!(f.error_message.contains("nowhere")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_run_in_order_on_every_handler() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        {
            let seen = Arc::clone(&seen);
            router.on("log", move |n: u32| {
                let seen = Arc::clone(&seen);
                async move {
                    // Earlier commands sleep longer; order must still hold.
                    tokio::time::sleep(Duration::from_millis(u64::from(10 - n))).await;
                    seen.lock().push(n);
                }
            });
        }
        {
            let count = Arc::clone(&count);
            router.on("log", move |_: u32| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        router.handle("flush", |_: ()| async { Ok::<_, String>(()) });
        let (client, _events, _) = connect(router);

        for n in 0..5u32 {
            client.emit("log", &n).unwrap();
        }
        client.emit("unknown-command", &()).unwrap();

        for _ in 0..100 {
            if count.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*seen.lock(), [0, 1, 2, 3, 4]);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        client.request::<_, ()>("flush", &()).await.unwrap();
    }

    #[tokio::test]
    async fn events_flow_to_the_ui() {
        let (_client, mut events, sender) = connect(Router::new());
        sender.send("request-window-close", &()).unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.channel, "request-window-close");
        event.decode::<()>().unwrap();
    }

    #[tokio::test]
    async fn sync_query_needs_no_worker() {
        let mut router = Router::new();
        router.handle_sync("len", |s: String| Ok::<_, String>(s.len()));
        let (client, _events, _) = connect(router);

        let len: usize = client.query_sync("len", "abcd").unwrap();
        assert_eq!(len, 4);
        let via_worker: usize = client.request("len", "abc").await.unwrap();
        assert_eq!(via_worker, 3);
    }

    #[tokio::test]
    async fn pending_requests_fail_when_worker_goes_away() {
        let (ui, worker) = tokio::io::duplex(1024);
        let (ui_read, ui_write) = tokio::io::split(ui);
        let (client, _events) = BridgeClient::connect(ui_read, ui_write, Default::default());

        let waiting = {
            let client = client.clone();
            tokio::spawn(async move { client.request::<_, ()>("never", &()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(worker);

        assert!(matches!(waiting.await.unwrap(), Err(BridgeError::Disconnected)));
        assert!(matches!(
            client.request::<_, ()>("never", &()).await,
            Err(BridgeError::Disconnected)
        ));
    }

    fn connect_with_limits(router: Router, client_limit: usize, server_limit: usize) -> BridgeClient {
        let (ui, worker) = tokio::io::duplex(64 * 1024);
        let (ui_read, ui_write) = tokio::io::split(ui);
        let (worker_read, worker_write) = tokio::io::split(worker);
        let server = Server::new(router).with_max_frame_bytes(server_limit);
        tokio::spawn(server.serve(worker_read, worker_write));
        BridgeClient::connect_with_limit(ui_read, ui_write, Default::default(), client_limit).0
    }

    fn echo_router() -> Router {
        let mut router = Router::new();
        router.handle("echo", |value: String| async move { Ok::<_, String>(value) });
        router.handle("repeat", |n: usize| async move { Ok::<_, String>("x".repeat(n)) });
        router
    }

    #[tokio::test]
    async fn client_fails_oversized_request() {
        let client = connect_with_limits(echo_router(), 256, DEFAULT_MAX_FRAME_BYTES);

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            client.request::<_, String>("echo", &"x".repeat(1024)),
        )
        .await
        .expect("oversized request must not hang");
        assert!(matches!(outcome, Err(BridgeError::FrameTooLarge { .. })));
        assert!(matches!(
            client.emit("log", &"x".repeat(1024)),
            Err(BridgeError::FrameTooLarge { .. })
        ));
        assert_eq!(client.in_flight(), 0);
        assert!(client.is_connected());

        let echoed: String = client.request("echo", "small").await.unwrap();
        assert_eq!(echoed, "small");
    }

    #[tokio::test]
    async fn server_reports_oversized_response() {
        let client = connect_with_limits(echo_router(), DEFAULT_MAX_FRAME_BYTES, 256);

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            client.request::<_, String>("repeat", &1024usize),
        )
        .await
        .expect("oversized response must not hang");
        match outcome {
            Err(BridgeError::Failure(f)) => assert!(f.error_message.contains("not deliverable")),
            other => panic!("expected failure, got {other:?}"),
        }

        let echoed: String = client.request("echo", "small").await.unwrap();
        assert_eq!(echoed, "small");
        assert_eq!(client.in_flight(), 0);
    }
}
