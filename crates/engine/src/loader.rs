use studio_bridge::{
    BridgeClient, ProjectConfigsPayload, ProjectDataPayload, ProjectTextsPayload, channels,
};
use studio_core::{Collection, DbSymbol, ProjectText, SelectedIdentifier, ValidatorSet};

use crate::error::EngineError;
use crate::state::{CollectionMap, ProjectSnapshot, ProjectState};

/// Read the whole project through the worker and build the initial state.
pub async fn load_project(client: &BridgeClient, validators: &ValidatorSet) -> Result<ProjectState, EngineError> {
    let data: ProjectDataPayload = client.request(channels::READ_PROJECT_DATA, &()).await?;
    let configs: ProjectConfigsPayload = client.request(channels::READ_PROJECT_CONFIGS, &()).await?;
    let texts: ProjectTextsPayload = client.request(channels::READ_PROJECT_TEXTS, &()).await?;
    build_state(data, configs, texts, validators)
}

/// Validate every entity and assemble the first snapshot.
///
/// The first invalid entity rejects the whole project; nothing partial is
/// returned.
pub fn build_state(
    data: ProjectDataPayload,
    configs: ProjectConfigsPayload,
    texts: ProjectTextsPayload,
    validators: &ValidatorSet,
) -> Result<ProjectState, EngineError> {
    let mut snapshot = ProjectSnapshot::new(ProjectText { files: texts.files }, configs.language);
    let mut total = 0usize;

    for (collection, records) in data.collections {
        let mut entities = CollectionMap::new();
        for (key, entity) in records {
            validators
                .validate(collection, &key, &entity)
                .map_err(EngineError::from_validation)?;
            entities.insert(DbSymbol::new(key)?, entity);
        }
        total += entities.len();
        snapshot = snapshot.with_collection(collection, entities);
    }

    for collection in Collection::ALL {
        let selected = initial_selection(collection, &snapshot.collection(collection));
        snapshot = snapshot.with_selection(collection, selected);
    }

    tracing::info!(entities = total, text_files = snapshot.text().texts.files.len(), "project loaded");
    Ok(ProjectState::new(snapshot))
}

/// Entity with the lowest `id`, or the first symbol when none has an id.
fn initial_selection(collection: Collection, entities: &CollectionMap) -> SelectedIdentifier {
    let lowest = entities
        .iter()
        .filter_map(|(symbol, entity)| entity.id().map(|id| (id, symbol)))
        .min()
        .map(|(_, symbol)| symbol)
        .or_else(|| entities.keys().next());
    match lowest {
        Some(symbol) => SelectedIdentifier::for_collection(collection, symbol.clone()),
        None => SelectedIdentifier::undefined(),
    }
}
