use studio_bridge::{BridgeClient, BridgeEvents, channels};

use crate::error::EngineError;
use crate::save::{SaveReport, save_project};
use crate::state::ProjectState;

#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// Everything was saved and the worker was told it may tear down.
    Confirmed(SaveReport),
    /// Some writes failed; the window stays open until the user decides.
    Blocked(SaveReport),
    /// The worker went away before asking.
    Disconnected,
}

/// UI half of the window-close handshake.
///
/// The worker never tears down on its own: it sends `request-window-close`
/// and waits for `window-close-confirmed`, which is only sent once pending
/// changes are saved or the user chose to discard them.
pub struct CloseHandshake {
    client: BridgeClient,
}

impl CloseHandshake {
    pub fn new(client: BridgeClient) -> Self {
        Self { client }
    }

    /// Save, then confirm when nothing failed.
    pub async fn on_close_requested(&self, state: &mut ProjectState) -> Result<CloseOutcome, EngineError> {
        let report = save_project(state, &self.client).await?;
        if report.is_success() {
            self.confirm()?;
            Ok(CloseOutcome::Confirmed(report))
        } else {
            tracing::warn!(failures = report.failures.len(), "close blocked by failed saves");
            Ok(CloseOutcome::Blocked(report))
        }
    }

    /// Let the worker close regardless of unsaved changes.
    pub fn confirm(&self) -> Result<(), EngineError> {
        self.client.emit(channels::WINDOW_CLOSE_CONFIRMED, &())?;
        Ok(())
    }

    /// Wait for the worker's close request, skipping other events, and
    /// answer it.
    pub async fn run(&self, events: &mut BridgeEvents, state: &mut ProjectState) -> Result<CloseOutcome, EngineError> {
        while let Some(event) = events.recv().await {
            if event.channel == channels::REQUEST_WINDOW_CLOSE {
                tracing::info!("worker requested window close");
                return self.on_close_requested(state).await;
            }
            tracing::debug!(channel = %event.channel, "ignoring worker event");
        }
        Ok(CloseOutcome::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use studio_bridge::{DeleteEntityRequest, Router, SaveEntityRequest, Server};
    use studio_core::{DbSymbol, Entity};
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn close_waits_for_save_then_confirms() {
        let (confirmed_tx, mut confirmed_rx) = mpsc::unbounded_channel();
        let mut router = Router::new();
        router.handle(channels::SAVE_PROJECT_DATA, |req: SaveEntityRequest| async move {
            if req.db_symbol == "locked" {
                Err("file is read-only".to_string())
            } else {
                Ok(())
            }
        });
        router.handle(channels::DELETE_PROJECT_DATA, |_: DeleteEntityRequest| async {
            Ok::<_, String>(true)
        });
        router.on(channels::WINDOW_CLOSE_CONFIRMED, move |_: ()| {
            let confirmed_tx = confirmed_tx.clone();
            async move {
                let _ = confirmed_tx.send(());
            }
        });

        let (ui, worker) = tokio::io::duplex(64 * 1024);
        let (ui_read, ui_write) = tokio::io::split(ui);
        let (worker_read, worker_write) = tokio::io::split(worker);
        let server = Server::new(router);
        let worker_events = server.events();
        tokio::spawn(server.serve(worker_read, worker_write));
        let (client, mut events) = BridgeClient::connect(ui_read, ui_write, Default::default());
        let handshake = CloseHandshake::new(client);

        let mut state = ProjectState::default();
        let locked = Entity::from_value(json!({"klass": "Zone", "id": 1, "dbSymbol": "locked"})).unwrap();
        state.zones().write(&DbSymbol::new("locked").unwrap(), locked, None);

        worker_events.send(channels::REQUEST_WINDOW_CLOSE, &()).unwrap();
        let outcome = handshake.run(&mut events, &mut state).await.unwrap();
        assert!(matches!(outcome, CloseOutcome::Blocked(_)));
        assert_eq!(state.dirty().len(), 1);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), confirmed_rx.recv())
                .await
                .is_err()
        );

        let town = Entity::from_value(json!({"klass": "Zone", "id": 1, "dbSymbol": "town"})).unwrap();
        state
            .zones()
            .remove(&DbSymbol::new("locked").unwrap(), DbSymbol::new("town").unwrap().into())
            .unwrap();
        state.zones().write(&DbSymbol::new("town").unwrap(), town, None);

        worker_events.send(channels::REQUEST_WINDOW_CLOSE, &()).unwrap();
        let outcome = handshake.run(&mut events, &mut state).await.unwrap();
        assert!(matches!(outcome, CloseOutcome::Confirmed(_)));
        assert!(state.dirty().is_empty());
        assert_eq!(confirmed_rx.recv().await, Some(()));
    }
}
