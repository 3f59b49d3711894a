use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Notify;

use studio_bridge::{BridgeClient, BridgeEvents, EventSender, Server};
use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, TextTable, ValidatorSet};
use studio_engine::{EngineError, ProjectState, load_project};
use studio_storage::{FsProjectStorage, ProjectStorage, SqliteStorage};
use studio_worker::{SharedStorage, Worker, sync_handlers};

use crate::faults::{FaultPlan, FaultyStorage};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

/// A project on disk with a worker serving it over an in-process bridge.
///
/// Must be created inside a tokio runtime.
pub struct TestProject {
    pub dir: TempDir,
    pub client: BridgeClient,
    pub events: BridgeEvents,
    pub worker_events: EventSender,
    pub close_confirmed: Arc<Notify>,
    pub faults: FaultPlan,
    storage: SharedStorage,
}

impl TestProject {
    /// Empty project in the native folder layout.
    pub fn new() -> TestResult<Self> {
        let dir = tempfile::tempdir()?;
        let storage = FsProjectStorage::create(dir.path())?;
        Ok(Self::serve(dir, storage))
    }

    /// Same worker, records kept in an in-memory SQLite database.
    pub fn in_memory() -> TestResult<Self> {
        let dir = tempfile::tempdir()?;
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self::serve(dir, storage))
    }

    fn serve(dir: TempDir, storage: impl ProjectStorage + Send + 'static) -> Self {
        let faults = FaultPlan::default();
        let worker = Worker::new(FaultyStorage::new(storage, faults.clone()), dir.path());
        let server = Server::new(worker.router());
        let worker_events = server.events();

        let (ui, worker_end) = tokio::io::duplex(256 * 1024);
        let (ui_read, ui_write) = tokio::io::split(ui);
        let (worker_read, worker_write) = tokio::io::split(worker_end);
        tokio::spawn(server.serve(worker_read, worker_write));
        let (client, events) = BridgeClient::connect(ui_read, ui_write, sync_handlers());

        Self {
            dir,
            client,
            events,
            worker_events,
            close_confirmed: worker.close_confirmed(),
            faults,
            storage: worker.storage(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Store a record directly, as if it had been on disk before the editor opened.
    pub fn seed(&self, collection: Collection, record: Value) -> TestResult<DbSymbol> {
        let entity = Entity::from_value(record)?;
        let symbol = entity.symbol()?;
        self.storage.lock().save_entity(collection, &symbol, &entity)?;
        Ok(symbol)
    }

    pub fn seed_text(&self, file_id: u32, table: &TextTable) -> TestResult<()> {
        self.storage.lock().save_text_file(file_id, table)?;
        Ok(())
    }

    pub fn seed_language(&self, config: &LanguageConfig) -> TestResult<()> {
        self.storage.lock().save_language_config(config)?;
        Ok(())
    }

    /// Record currently persisted under `db_symbol`.
    pub fn stored(&self, collection: Collection, db_symbol: &str) -> TestResult<Option<Entity>> {
        let symbol = DbSymbol::new(db_symbol)?;
        Ok(self.storage.lock().load_entity(collection, &symbol)?)
    }

    pub fn stored_text(&self, file_id: u32, text_id: usize, language: &str) -> TestResult<String> {
        Ok(self.storage.lock().load_texts()?.get_text(file_id, text_id, language))
    }

    pub async fn load(&self) -> Result<ProjectState, EngineError> {
        load_project(&self.client, &ValidatorSet::default()).await
    }
}
