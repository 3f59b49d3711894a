use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BridgeError, BridgeFailure};
use crate::protocol::{decode_payload, encode_payload};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type RequestHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<Result<Vec<u8>, BridgeFailure>> + Send + Sync>;
type CommandHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<()> + Send + Sync>;
type SyncHandler = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, BridgeFailure> + Send + Sync>;

fn failure(e: impl Display) -> BridgeFailure {
    BridgeFailure::new(e.to_string())
}

/// Cheap deterministic queries answered within the calling turn instead of
/// going through the worker's asynchronous path.
#[derive(Clone, Default)]
pub struct SyncHandlers {
    handlers: Arc<HashMap<String, SyncHandler>>,
}

impl SyncHandlers {
    pub fn call(&self, channel: &str, payload: &[u8]) -> Result<Vec<u8>, BridgeError> {
        let handler = self
            .handlers
            .get(channel)
            .ok_or_else(|| BridgeError::UnknownChannel(channel.to_string()))?;
        Ok(handler(payload)?)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }
}

/// Worker-side table of channel handlers.
///
/// A request channel has exactly one handler. A command channel may have any
/// number; they run one after another, in registration order, for each
/// command received.
#[derive(Default)]
pub struct Router {
    requests: HashMap<String, RequestHandler>,
    commands: HashMap<String, Vec<CommandHandler>>,
    sync: HashMap<String, SyncHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the request/response handler of `channel`, replacing any previous one.
    pub fn handle<Req, Resp, E, F, Fut>(&mut self, channel: &str, handler: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        E: Display + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, E>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RequestHandler = Arc::new(move |payload: Vec<u8>| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = decode_payload(&payload).map_err(failure)?;
                let response = handler(request).await.map_err(failure)?;
                encode_payload(&response).map_err(failure)
            })
        });
        self.requests.insert(channel.to_string(), erased);
        self
    }

    /// Add a fire-and-forget handler to `channel`.
    pub fn on<Req, F, Fut>(&mut self, channel: &str, handler: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let channel_name = channel.to_string();
        let erased: CommandHandler = Arc::new(move |payload: Vec<u8>| {
            let handler = Arc::clone(&handler);
            let channel = channel_name.clone();
            Box::pin(async move {
                match decode_payload::<Req>(&payload) {
                    Ok(command) => handler(command).await,
                    Err(e) => tracing::warn!(%channel, error = %e, "dropping undecodable command"),
                }
            })
        });
        self.commands
            .entry(channel.to_string())
            .or_default()
            .push(erased);
        self
    }

    /// Register a synchronous query. The handler must be pure: it runs on
    /// the caller's side of the bridge.
    pub fn handle_sync<Req, Resp, E, F>(&mut self, channel: &str, handler: F) -> &mut Self
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        E: Display + 'static,
        F: Fn(Req) -> Result<Resp, E> + Send + Sync + 'static,
    {
        let erased: SyncHandler = Arc::new(move |payload: &[u8]| {
            let request: Req = decode_payload(payload).map_err(failure)?;
            let response = handler(request).map_err(failure)?;
            encode_payload(&response).map_err(failure)
        });
        self.sync.insert(channel.to_string(), erased);
        self
    }

    pub fn sync_handlers(&self) -> SyncHandlers {
        SyncHandlers {
            handlers: Arc::new(self.sync.clone()),
        }
    }

    pub(crate) fn request_handler(&self, channel: &str) -> Option<RequestHandler> {
        self.requests.get(channel).cloned()
    }

    pub(crate) fn command_handlers(&self, channel: &str) -> Option<Vec<CommandHandler>> {
        self.commands.get(channel).cloned()
    }

    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .requests
            .keys()
            .chain(self.commands.keys())
            .chain(self.sync.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_handlers_answer_inline() {
        let mut router = Router::new();
        router.handle_sync("double", |n: u32| Ok::<_, String>(n * 2));
        router.handle_sync("fail", |_: u32| Err::<u32, _>("nope"));
        let sync = router.sync_handlers();

        let answer = sync.call("double", &encode_payload(&21u32).unwrap()).unwrap();
        assert_eq!(decode_payload::<u32>(&answer).unwrap(), 42);

        match sync.call("fail", &encode_payload(&1u32).unwrap()) {
            Err(BridgeError::Failure(f)) => assert_eq!(f.error_message, "nope"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(sync.call("missing", &[]), Err(BridgeError::UnknownChannel(_))));
    }

    #[test]
    fn channels_are_listed_once() {
        let mut router = Router::new();
        router
            .handle("read", |_: ()| async { Ok::<_, String>(()) })
            .on("ping", |_: ()| async {})
            .on("ping", |_: ()| async {});
        assert_eq!(router.channels(), ["ping", "read"]);
        assert_eq!(router.command_handlers("ping").map(|h| h.len()), Some(2));
    }
}
