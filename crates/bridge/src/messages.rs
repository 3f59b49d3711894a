//! Payloads of the project channels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use studio_core::{Collection, DbSymbol, Entity, LanguageConfig, TextTable};

/// Every collection of the project as stored, keyed by stored symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDataPayload {
    pub collections: BTreeMap<Collection, BTreeMap<String, Entity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfigsPayload {
    pub language: LanguageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTextsPayload {
    pub files: BTreeMap<u32, TextTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEntityRequest {
    pub collection: Collection,
    pub db_symbol: DbSymbol,
    pub entity: Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEntityRequest {
    pub collection: Collection,
    pub db_symbol: DbSymbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveTextFileRequest {
    pub file_id: u32,
    pub table: TextTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExistsRequest {
    /// Path relative to the project root.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Normal,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartGameCommand {
    pub mode: GameMode,
}
