use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, ProjectText, TextTable};

use crate::error::StorageError;

/// Persisted side of the project: where the worker reads entities from and
/// writes dirty entities back to.
///
/// Loading returns records as stored; checking their shape is the loader's job.
pub trait ProjectStorage {
    fn load_collection(&self, collection: Collection) -> Result<Vec<(String, Entity)>, StorageError>;

    /// Write one entity, replacing any previous record under the same symbol.
    /// Other records are never touched.
    fn save_entity(
        &mut self,
        collection: Collection,
        db_symbol: &DbSymbol,
        entity: &Entity,
    ) -> Result<(), StorageError>;

    /// Remove one entity. Returns `false` when nothing was stored under `db_symbol`.
    fn delete_entity(&mut self, collection: Collection, db_symbol: &DbSymbol) -> Result<bool, StorageError>;

    fn load_entity(
        &self,
        collection: Collection,
        db_symbol: &DbSymbol,
    ) -> Result<Option<Entity>, StorageError>;

    fn load_texts(&self) -> Result<ProjectText, StorageError>;

    fn save_text_file(&mut self, file_id: u32, table: &TextTable) -> Result<(), StorageError>;

    fn load_language_config(&self) -> Result<LanguageConfig, StorageError>;

    fn save_language_config(&mut self, config: &LanguageConfig) -> Result<(), StorageError>;
}
