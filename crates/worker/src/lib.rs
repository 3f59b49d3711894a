//! Worker process of the editor: owns the project files and serves the UI
//! over the bridge.

pub mod error;
pub mod handlers;
pub mod logging;
pub mod settings;

pub use error::WorkerError;
pub use handlers::{SharedStorage, Worker, content_hash, sync_handlers};
pub use logging::setup_tracing;
pub use settings::WorkerSettings;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;

use studio_bridge::{EventSender, Server, channels};
use studio_storage::FsProjectStorage;

/// Serve `settings.project_path` until the UI hangs up or confirms a close
/// request raised by `shutdown`.
pub async fn run<R, W, S>(settings: &WorkerSettings, reader: R, writer: W, shutdown: S) -> Result<(), WorkerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    S: std::future::Future<Output = ()>,
{
    let storage = FsProjectStorage::open(&settings.project_path)?;
    let worker = Worker::new(storage, &settings.project_path);
    let server = Server::new(worker.router()).with_max_frame_bytes(settings.max_frame_bytes);
    let events = server.events();
    let closed = worker.close_confirmed();
    tracing::info!(project = %settings.project_path.display(), "worker serving");

    tokio::select! {
        served = server.serve(reader, writer) => served?,
        () = close_after_confirmation(events, closed, shutdown) => {}
    }
    tracing::info!("worker stopped");
    Ok(())
}

/// Ask the UI to close once `shutdown` fires, then wait for its answer.
async fn close_after_confirmation(events: EventSender, closed: Arc<Notify>, shutdown: impl std::future::Future<Output = ()>) {
    shutdown.await;
    tracing::info!("shutdown requested, asking the ui to close");
    if let Err(e) = events.send(channels::REQUEST_WINDOW_CLOSE, &()) {
        tracing::warn!(error = %e, "could not reach the ui");
        return;
    }
    closed.notified().await;
}
