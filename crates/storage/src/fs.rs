use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, ProjectText, TextTable};

use crate::text_table;
use crate::error::StorageError;
use crate::traits::ProjectStorage;

const STUDIO_DATA_DIR: &str = "Data/Studio";
const TEXT_DIR: &str = "Data/Text/Dialogs";
const LANGUAGE_CONFIG_FILE: &str = "Data/configs/language_config.json";

/// Project in its native on-disk layout: one pretty-printed JSON file per
/// entity, one CSV file per text table.
pub struct FsProjectStorage {
    root: PathBuf,
}

impl FsProjectStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StorageError::NotFound(format!("project folder {}", root.display())));
        }
        Ok(Self { root })
    }

    /// Lay out an empty project under `root`.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        for collection in Collection::ALL {
            fs::create_dir_all(root.join(STUDIO_DATA_DIR).join(collection.folder()))?;
        }
        fs::create_dir_all(root.join(TEXT_DIR))?;
        let storage = Self { root };
        let config_path = storage.root.join(LANGUAGE_CONFIG_FILE);
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            write_atomic(&config_path, &serde_json::to_string_pretty(&LanguageConfig::default())?)?;
        }
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(STUDIO_DATA_DIR).join(collection.folder())
    }

    pub fn entity_path(&self, collection: Collection, db_symbol: &DbSymbol) -> PathBuf {
        self.collection_dir(collection)
            .join(format!("{}.json", db_symbol.as_str()))
    }

    pub fn text_path(&self, file_id: u32) -> PathBuf {
        self.root.join(TEXT_DIR).join(format!("{file_id}.csv"))
    }
}

/// Write through a sibling temp file so a crash never leaves a half-written record.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ProjectStorage for FsProjectStorage {
    fn load_collection(&self, collection: Collection) -> Result<Vec<(String, Entity)>, StorageError> {
        let dir = self.collection_dir(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            let entity = Entity::from_json(&raw).map_err(|e| {
                StorageError::Serialization(format!("{}: {e}", path.display()))
            })?;
            records.push((key.to_string(), entity));
        }
        records.sort_by(|a, b| a.0.cmp(&b.0));
        tracing::debug!(%collection, count = records.len(), "loaded collection from disk");
        Ok(records)
    }

    fn save_entity(
        &mut self,
        collection: Collection,
        db_symbol: &DbSymbol,
        entity: &Entity,
    ) -> Result<(), StorageError> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)?;
        let path = self.entity_path(collection, db_symbol);
        write_atomic(&path, &entity.to_json_pretty()?)
    }

    fn delete_entity(&mut self, collection: Collection, db_symbol: &DbSymbol) -> Result<bool, StorageError> {
        match fs::remove_file(self.entity_path(collection, db_symbol)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn load_entity(
        &self,
        collection: Collection,
        db_symbol: &DbSymbol,
    ) -> Result<Option<Entity>, StorageError> {
        match fs::read_to_string(self.entity_path(collection, db_symbol)) {
            Ok(raw) => Ok(Some(Entity::from_json(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_texts(&self) -> Result<ProjectText, StorageError> {
        let mut texts = ProjectText::new();
        let entries = match fs::read_dir(self.root.join(TEXT_DIR)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(texts),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(file_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            let rows = text_table::parse(&fs::read_to_string(&path)?)?;
            texts.files.insert(file_id, TextTable { rows });
        }
        Ok(texts)
    }

    fn save_text_file(&mut self, file_id: u32, table: &TextTable) -> Result<(), StorageError> {
        let path = self.text_path(file_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, &text_table::write(&table.rows)?)
    }

    fn load_language_config(&self) -> Result<LanguageConfig, StorageError> {
        let path = self.root.join(LANGUAGE_CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(LanguageConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_language_config(&mut self, config: &LanguageConfig) -> Result<(), StorageError> {
        let path = self.root.join(LANGUAGE_CONFIG_FILE);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, &serde_json::to_string_pretty(config)?)
    }
}
