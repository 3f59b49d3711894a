use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity::Entity;
use crate::ids::Collection;

/// Language settings of a project (`Data/configs/language_config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    pub default_language: String,
    #[serde(default)]
    pub choosable_language_code: Vec<String>,
    #[serde(default)]
    pub choosable_language_texts: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_language: "en".into(),
            choosable_language_code: vec!["en".into()],
            choosable_language_texts: vec!["English".into()],
        }
    }
}

/// One text file: a header row of language codes followed by one row per text id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTable {
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(languages: &[&str]) -> Self {
        Self {
            rows: vec![languages.iter().map(|l| l.to_string()).collect()],
        }
    }

    pub fn languages(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    fn column(&self, language: &str) -> usize {
        self.languages()
            .iter()
            .position(|l| l == language)
            .unwrap_or(0)
    }

    pub fn get(&self, text_id: usize, language: &str) -> Option<&str> {
        let column = self.column(language);
        self.rows
            .get(text_id + 1)
            .and_then(|row| row.get(column))
            .map(String::as_str)
    }

    /// Set a text, growing the table with empty cells as needed.
    pub fn set(&mut self, text_id: usize, language: &str, text: impl Into<String>) {
        if self.rows.is_empty() {
            self.rows.push(vec![language.to_string()]);
        }
        let existing = self.languages().iter().position(|l| l == language);
        let column = match existing {
            Some(c) => c,
            None => {
                self.rows[0].push(language.to_string());
                self.rows[0].len() - 1
            }
        };
        let width = self.rows[0].len();
        while self.rows.len() <= text_id + 1 {
            self.rows.push(vec![String::new(); width]);
        }
        let row = &mut self.rows[text_id + 1];
        if row.len() < width {
            row.resize(width, String::new());
        }
        row[column] = text.into();
    }
}

/// All text files of a project keyed by file id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectText {
    pub files: BTreeMap<u32, TextTable>,
}

impl ProjectText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, file_id: u32) -> Option<&TextTable> {
        self.files.get(&file_id)
    }

    pub fn table_mut(&mut self, file_id: u32) -> &mut TextTable {
        self.files.entry(file_id).or_default()
    }

    /// Text `text_id` of `file_id` in `language`, with the not-found marker
    /// when the file or row is missing.
    pub fn get_text(&self, file_id: u32, text_id: usize, language: &str) -> String {
        self.table(file_id)
            .and_then(|t| t.get(text_id, language))
            .map(str::to_string)
            .unwrap_or_else(|| format!("[{file_id}, {text_id}] text not found"))
    }
}

/// Transient reference to the project texts handed to editor surfaces along
/// with an entity. It is never part of the entity's saved record.
#[derive(Debug, Clone)]
pub struct TextBinding {
    pub texts: Arc<ProjectText>,
    pub config: Arc<LanguageConfig>,
}

impl TextBinding {
    pub fn new(texts: Arc<ProjectText>, config: Arc<LanguageConfig>) -> Self {
        Self { texts, config }
    }

    pub fn language(&self) -> &str {
        &self.config.default_language
    }

    /// Display name of `entity` within `collection`.
    ///
    /// Entities carrying a `textId` are looked up through it, the others
    /// through their numeric `id`. Without a name file or index the
    /// `dbSymbol` is used.
    pub fn entity_name(&self, collection: Collection, entity: &Entity) -> String {
        let fallback = || entity.db_symbol().unwrap_or_default().to_string();
        let Some(file_id) = collection.name_text_file() else {
            return fallback();
        };
        let index = entity.text_id().or_else(|| entity.id());
        match index.and_then(|i| usize::try_from(i).ok()) {
            Some(index) => self.texts.get_text(file_id, index, self.language()),
            None => fallback(),
        }
    }
}

/// An entity paired with the text binding used to display it.
#[derive(Debug, Clone)]
pub struct BoundEntity {
    pub collection: Collection,
    pub entity: Entity,
    pub text: TextBinding,
}

impl BoundEntity {
    pub fn name(&self) -> String {
        self.text.entity_name(self.collection, &self.entity)
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }
}
