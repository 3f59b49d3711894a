//! Save pass: persists the dirty set through the worker.
//!
//! A pass runs in three steps so the UI stays editable while requests are in
//! flight:
//! 1. [`begin_save`] captures what to write from the current snapshot.
//! 2. [`execute_save`] sends one request per entry and per text file.
//! 3. [`finish_save`] clears what was persisted.
//!
//! Failures are per entry: entries whose request succeeded are cleared,
//! failed ones stay dirty with their intent for the next pass. An entry
//! marked again while the pass was running also stays dirty.

use studio_bridge::{
    BridgeClient, BridgeError, DeleteEntityRequest, SaveEntityRequest, SaveTextFileRequest, channels,
};
use studio_core::{DbSymbol, DirtyKey, Entity, SaveIntent, TextTable};

use crate::error::EngineError;
use crate::state::ProjectState;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    Update(Entity),
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEntry {
    pub key: DirtyKey,
    pub db_symbol: DbSymbol,
    pub revision: u64,
    pub action: SaveAction,
}

/// Everything one save pass will send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    pub entries: Vec<PlannedEntry>,
    pub texts: Vec<(u32, TextTable)>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.texts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    Entity(DirtyKey),
    Text(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub target: SaveTarget,
    pub error_message: String,
}

/// Outcome of [`execute_save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Persisted entries with the revision they were persisted at.
    pub persisted: Vec<(DirtyKey, u64)>,
    pub texts: Vec<(u32, TextTable)>,
    pub failures: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Capture the dirty entries and dirty text files of the current snapshot.
pub fn begin_save(state: &ProjectState) -> Result<SavePlan, EngineError> {
    let snapshot = state.snapshot();
    let mut plan = SavePlan::default();

    for (key, entry) in snapshot.dirty().iter() {
        let db_symbol = DbSymbol::new(key.id.as_str())?;
        let action = match entry.intent {
            SaveIntent::Delete => SaveAction::Delete,
            SaveIntent::Update => {
                let entity = snapshot.entity(key.collection, &key.id).ok_or_else(|| {
                    EngineError::Precondition(format!(
                        "{} {} is marked for update but missing from the store",
                        key.collection, key.id
                    ))
                })?;
                SaveAction::Update(entity.clone())
            }
        };
        plan.entries.push(PlannedEntry {
            key: key.clone(),
            db_symbol,
            revision: entry.revision,
            action,
        });
    }

    for file_id in state.text_flags().files() {
        let table = snapshot
            .text()
            .texts
            .table(file_id)
            .cloned()
            .unwrap_or_default();
        plan.texts.push((file_id, table));
    }

    Ok(plan)
}

fn failure_message(e: BridgeError) -> String {
    match e {
        BridgeError::Failure(failure) => failure.error_message,
        other => other.to_string(),
    }
}

/// Send every planned write. Never stops early: each entry is attempted and
/// reported on its own.
pub async fn execute_save(client: &BridgeClient, plan: SavePlan) -> SaveReport {
    let mut report = SaveReport::default();

    for entry in plan.entries {
        let PlannedEntry {
            key,
            db_symbol,
            revision,
            action,
        } = entry;
        let result = match action {
            SaveAction::Update(entity) => {
                let request = SaveEntityRequest {
                    collection: key.collection,
                    db_symbol,
                    entity,
                };
                client
                    .request::<_, ()>(channels::SAVE_PROJECT_DATA, &request)
                    .await
            }
            SaveAction::Delete => {
                let request = DeleteEntityRequest {
                    collection: key.collection,
                    db_symbol,
                };
                client
                    .request::<_, bool>(channels::DELETE_PROJECT_DATA, &request)
                    .await
                    .map(|_| ())
            }
        };
        match result {
            Ok(()) => report.persisted.push((key, revision)),
            Err(e) => {
                let error_message = failure_message(e);
                tracing::warn!(collection = %key.collection, id = %key.id, error = %error_message, "save failed");
                report.failures.push(SaveFailure {
                    target: SaveTarget::Entity(key),
                    error_message,
                });
            }
        }
    }

    for (file_id, table) in plan.texts {
        let request = SaveTextFileRequest {
            file_id,
            table: table.clone(),
        };
        match client
            .request::<_, ()>(channels::SAVE_PROJECT_TEXTS, &request)
            .await
        {
            Ok(()) => report.texts.push((file_id, table)),
            Err(e) => {
                let error_message = failure_message(e);
                tracing::warn!(file_id, error = %error_message, "text save failed");
                report.failures.push(SaveFailure {
                    target: SaveTarget::Text(file_id),
                    error_message,
                });
            }
        }
    }

    report
}

/// Clear what `report` persisted, in one transition. Returns how many dirty
/// entries were cleared.
pub fn finish_save(state: &mut ProjectState, report: &SaveReport) -> usize {
    let mut cleared = 0;
    state.transition(|next| {
        for (key, revision) in &report.persisted {
            if next.dirty.clear_if_unchanged(key, *revision) {
                cleared += 1;
            }
        }
    });

    let snapshot = state.snapshot();
    for (file_id, saved) in &report.texts {
        // Only clear when the file was not edited again in the meantime.
        let current = snapshot.text().texts.table(*file_id).cloned().unwrap_or_default();
        if &current == saved {
            state.text_flags_mut().clear(*file_id);
        }
    }
    state.refresh_text_indicator();

    tracing::info!(
        cleared,
        remaining = state.dirty().len(),
        failures = report.failures.len(),
        "save pass finished"
    );
    cleared
}

/// Run a full pass against a state nobody else edits meanwhile.
pub async fn save_project(state: &mut ProjectState, client: &BridgeClient) -> Result<SaveReport, EngineError> {
    let plan = begin_save(state)?;
    if plan.is_empty() {
        return Ok(SaveReport::default());
    }
    let report = execute_save(client, plan).await;
    finish_save(state, &report);
    Ok(report)
}
