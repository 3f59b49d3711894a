use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, ProjectText, TextTable};
use studio_storage::{ProjectStorage, StorageError};

/// Symbols whose writes fail, shared between a test and its storage.
#[derive(Clone, Default)]
pub struct FaultPlan {
    symbols: Arc<Mutex<BTreeSet<String>>>,
    text_files: Arc<Mutex<BTreeSet<u32>>>,
}

impl FaultPlan {
    pub fn fail_symbol(&self, db_symbol: &str) {
        self.symbols.lock().insert(db_symbol.to_string());
    }

    pub fn heal_symbol(&self, db_symbol: &str) {
        self.symbols.lock().remove(db_symbol);
    }

    pub fn fail_text_file(&self, file_id: u32) {
        self.text_files.lock().insert(file_id);
    }

    pub fn heal_all(&self) {
        self.symbols.lock().clear();
        self.text_files.lock().clear();
    }

    fn check_symbol(&self, db_symbol: &DbSymbol) -> Result<(), StorageError> {
        if self.symbols.lock().contains(db_symbol.as_str()) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, format!("{db_symbol} is read-only")).into());
        }
        Ok(())
    }

    fn check_text(&self, file_id: u32) -> Result<(), StorageError> {
        if self.text_files.lock().contains(&file_id) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, format!("text file {file_id} is read-only")).into());
        }
        Ok(())
    }
}

/// Storage wrapper failing the writes named by its [`FaultPlan`].
pub struct FaultyStorage<S> {
    inner: S,
    plan: FaultPlan,
}

impl<S: ProjectStorage> FaultyStorage<S> {
    pub fn new(inner: S, plan: FaultPlan) -> Self {
        Self { inner, plan }
    }
}

impl<S: ProjectStorage> ProjectStorage for FaultyStorage<S> {
    fn load_collection(&self, collection: Collection) -> Result<Vec<(String, Entity)>, StorageError> {
        self.inner.load_collection(collection)
    }

    fn save_entity(&mut self, collection: Collection, db_symbol: &DbSymbol, entity: &Entity) -> Result<(), StorageError> {
        self.plan.check_symbol(db_symbol)?;
        self.inner.save_entity(collection, db_symbol, entity)
    }

    fn delete_entity(&mut self, collection: Collection, db_symbol: &DbSymbol) -> Result<bool, StorageError> {
        self.plan.check_symbol(db_symbol)?;
        self.inner.delete_entity(collection, db_symbol)
    }

    fn load_entity(&self, collection: Collection, db_symbol: &DbSymbol) -> Result<Option<Entity>, StorageError> {
        self.inner.load_entity(collection, db_symbol)
    }

    fn load_texts(&self) -> Result<ProjectText, StorageError> {
        self.inner.load_texts()
    }

    fn save_text_file(&mut self, file_id: u32, table: &TextTable) -> Result<(), StorageError> {
        self.plan.check_text(file_id)?;
        self.inner.save_text_file(file_id, table)
    }

    fn load_language_config(&self) -> Result<LanguageConfig, StorageError> {
        self.inner.load_language_config()
    }

    fn save_language_config(&mut self, config: &LanguageConfig) -> Result<(), StorageError> {
        self.inner.save_language_config(config)
    }
}
