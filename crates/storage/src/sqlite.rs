use rusqlite::{Connection, OptionalExtension};

use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, ProjectText, TextTable};

use crate::error::StorageError;
use crate::traits::ProjectStorage;

const LANGUAGE_CONFIG_KEY: &str = "language_config";

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    rmp_serde::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8], label: &str) -> Result<T, StorageError> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| StorageError::Serialization(format!("invalid {label}: {e}")))
}

/// Whole project in one SQLite file, records stored as msgpack blobs.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ProjectStorage for SqliteStorage {
    fn load_collection(&self, collection: Collection) -> Result<Vec<(String, Entity)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT db_symbol, record FROM entities WHERE collection = ?1 ORDER BY db_symbol",
        )?;
        let rows = stmt.query_map(rusqlite::params![collection.as_str()], |row| {
            let key: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((key, bytes))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (key, bytes) = row?;
            let entity: Entity = decode(&bytes, "entity record")?;
            result.push((key, entity));
        }
        Ok(result)
    }

    fn save_entity(
        &mut self,
        collection: Collection,
        db_symbol: &DbSymbol,
        entity: &Entity,
    ) -> Result<(), StorageError> {
        let record = encode(entity)?;
        self.conn.execute(
            "INSERT INTO entities (collection, db_symbol, record) VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, db_symbol) DO UPDATE SET
                record = excluded.record,
                updated_at = CAST(unixepoch('now','subsec') * 1000 AS INTEGER)",
            rusqlite::params![collection.as_str(), db_symbol.as_str(), record],
        )?;
        Ok(())
    }

    fn delete_entity(&mut self, collection: Collection, db_symbol: &DbSymbol) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM entities WHERE collection = ?1 AND db_symbol = ?2",
            rusqlite::params![collection.as_str(), db_symbol.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn load_entity(
        &self,
        collection: Collection,
        db_symbol: &DbSymbol,
    ) -> Result<Option<Entity>, StorageError> {
        let bytes: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT record FROM entities WHERE collection = ?1 AND db_symbol = ?2",
                rusqlite::params![collection.as_str(), db_symbol.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        bytes.map(|b| decode(&b, "entity record")).transpose()
    }

    fn load_texts(&self) -> Result<ProjectText, StorageError> {
        let mut stmt = self.conn.prepare("SELECT file_id, rows FROM text_files")?;
        let rows = stmt.query_map([], |row| {
            let file_id: u32 = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((file_id, bytes))
        })?;

        let mut texts = ProjectText::new();
        for row in rows {
            let (file_id, bytes) = row?;
            let rows: Vec<Vec<String>> = decode(&bytes, "text file")?;
            texts.files.insert(file_id, TextTable { rows });
        }
        Ok(texts)
    }

    fn save_text_file(&mut self, file_id: u32, table: &TextTable) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO text_files (file_id, rows) VALUES (?1, ?2)",
            rusqlite::params![file_id, encode(&table.rows)?],
        )?;
        Ok(())
    }

    fn load_language_config(&self) -> Result<LanguageConfig, StorageError> {
        let bytes: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value FROM project_config WHERE name = ?1",
                rusqlite::params![LANGUAGE_CONFIG_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match bytes {
            Some(b) => decode(&b, "language config"),
            None => Ok(LanguageConfig::default()),
        }
    }

    fn save_language_config(&mut self, config: &LanguageConfig) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO project_config (name, value) VALUES (?1, ?2)",
            rusqlite::params![LANGUAGE_CONFIG_KEY, encode(config)?],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbol(s: &str) -> DbSymbol {
        DbSymbol::new(s).unwrap()
    }

    #[test]
    fn upsert_replaces_record() -> Result<(), Box<dyn std::error::Error>> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let ember = Entity::from_value(json!({"klass": "Move", "id": 52, "dbSymbol": "ember", "power": 40}))?;
        storage.save_entity(Collection::Moves, &symbol("ember"), &ember)?;
        storage.save_entity(Collection::Moves, &symbol("ember"), &ember.with_field("power", 60))?;

        assert_eq!(storage.load_collection(Collection::Moves)?.len(), 1);
        let stored = storage.load_entity(Collection::Moves, &symbol("ember"))?.unwrap();
        assert_eq!(stored.get("power"), Some(&json!(60)));
        Ok(())
    }

    #[test]
    fn collections_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let record = Entity::from_value(json!({"klass": "Type", "id": 1, "dbSymbol": "normal"}))?;
        storage.save_entity(Collection::Types, &symbol("normal"), &record)?;

        assert!(storage.load_collection(Collection::Moves)?.is_empty());
        assert!(!storage.delete_entity(Collection::Moves, &symbol("normal"))?);
        assert_eq!(storage.load_collection(Collection::Types)?.len(), 1);
        assert!(storage.delete_entity(Collection::Types, &symbol("normal"))?);
        assert_eq!(storage.load_entity(Collection::Types, &symbol("normal"))?, None);
        Ok(())
    }

    #[test]
    fn texts_and_config_persist() -> Result<(), Box<dyn std::error::Error>> {
        let mut storage = SqliteStorage::open_in_memory()?;
        let mut table = TextTable::new(&["en"]);
        table.set(3, "en", "Poison");
        storage.save_text_file(100_003, &table)?;
        assert_eq!(storage.load_texts()?.get_text(100_003, 3, "en"), "Poison");

        assert_eq!(storage.load_language_config()?.default_language, "en");
        let config = LanguageConfig {
            default_language: "es".into(),
            ..LanguageConfig::default()
        };
        storage.save_language_config(&config)?;
        assert_eq!(storage.load_language_config()?, config);
        Ok(())
    }
}
