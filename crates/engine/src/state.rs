use std::collections::BTreeMap;
use std::sync::Arc;

use studio_core::{
    Collection, DbSymbol, DirtySet, Entity, LanguageConfig, ProjectText, SelectedIdentifier,
    TextBinding,
};

use crate::accessor::ProjectData;
use crate::text_flags::TextDirtyFlags;

/// Entities of one collection keyed by symbol.
pub type CollectionMap = BTreeMap<DbSymbol, Entity>;

/// One immutable state of the open project.
///
/// Collections are shared between snapshots; a transition rebuilds only the
/// collection it touches.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub(crate) collections: BTreeMap<Collection, Arc<CollectionMap>>,
    pub(crate) selection: BTreeMap<Collection, SelectedIdentifier>,
    pub(crate) dirty: DirtySet,
    pub(crate) text: TextBinding,
    pub(crate) has_pending_text_changes: bool,
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        Self::new(ProjectText::new(), LanguageConfig::default())
    }
}

impl ProjectSnapshot {
    pub fn new(texts: ProjectText, config: LanguageConfig) -> Self {
        Self {
            collections: BTreeMap::new(),
            selection: BTreeMap::new(),
            dirty: DirtySet::new(),
            text: TextBinding::new(Arc::new(texts), Arc::new(config)),
            has_pending_text_changes: false,
        }
    }

    pub fn with_collection(mut self, collection: Collection, entities: CollectionMap) -> Self {
        self.collections.insert(collection, Arc::new(entities));
        self
    }

    pub fn with_selection(mut self, collection: Collection, selected: SelectedIdentifier) -> Self {
        self.selection.insert(collection, selected);
        self
    }

    /// Entities of `collection`; empty when the project has none.
    pub fn collection(&self, collection: Collection) -> Arc<CollectionMap> {
        self.collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn entity(&self, collection: Collection, db_symbol: &str) -> Option<&Entity> {
        self.collections
            .get(&collection)
            .and_then(|entities| entities.get(db_symbol))
    }

    /// Selection of `collection`'s slot, `__undef__` when never set.
    pub fn selected(&self, collection: Collection) -> SelectedIdentifier {
        self.selection
            .get(&collection)
            .cloned()
            .unwrap_or_else(SelectedIdentifier::undefined)
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn text(&self) -> &TextBinding {
        &self.text
    }

    pub fn has_pending_text_changes(&self) -> bool {
        self.has_pending_text_changes
    }

    /// Whether both snapshots share the same map for `collection`.
    pub fn shares_collection(&self, other: &ProjectSnapshot, collection: Collection) -> bool {
        match (self.collections.get(&collection), other.collections.get(&collection)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Display name of `entity` as found in `collection`.
    pub fn entity_name(&self, collection: Collection, entity: &Entity) -> String {
        self.text.entity_name(collection, entity)
    }
}

/// Owner of the project state.
///
/// Every mutation computes a complete new [`ProjectSnapshot`] and installs it
/// in one step, so readers holding an older snapshot never see a half
/// applied change.
#[derive(Debug, Default)]
pub struct ProjectState {
    current: Arc<ProjectSnapshot>,
    text_flags: TextDirtyFlags,
}

impl ProjectState {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        Self {
            current: Arc::new(snapshot),
            text_flags: TextDirtyFlags::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<ProjectSnapshot> {
        Arc::clone(&self.current)
    }

    pub(crate) fn current(&self) -> &ProjectSnapshot {
        &self.current
    }

    pub(crate) fn install(&mut self, next: ProjectSnapshot) {
        self.current = Arc::new(next);
    }

    /// Apply `f` to a copy of the current snapshot and install the result.
    pub(crate) fn transition(&mut self, f: impl FnOnce(&mut ProjectSnapshot)) {
        let mut next = ProjectSnapshot::clone(&self.current);
        f(&mut next);
        self.install(next);
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.current.dirty
    }

    pub fn text_flags(&self) -> &TextDirtyFlags {
        &self.text_flags
    }

    pub fn has_pending_text_changes(&self) -> bool {
        self.current.has_pending_text_changes
    }

    /// Edit one text and flag its file for the next save.
    pub fn set_text(&mut self, file_id: u32, text_id: usize, language: &str, text: impl Into<String>) {
        let mut texts = ProjectText::clone(&self.current.text.texts);
        texts.table_mut(file_id).set(text_id, language, text);
        self.text_flags.mark(file_id);
        let config = Arc::clone(&self.current.text.config);
        self.transition(|next| {
            next.text = TextBinding::new(Arc::new(texts), config);
            next.has_pending_text_changes = true;
        });
    }

    pub(crate) fn text_flags_mut(&mut self) -> &mut TextDirtyFlags {
        &mut self.text_flags
    }

    /// Refresh the snapshot's pending-text indicator from the text flags.
    pub(crate) fn refresh_text_indicator(&mut self) {
        let pending = self.text_flags.any();
        if pending != self.current.has_pending_text_changes {
            self.transition(|next| next.has_pending_text_changes = pending);
        }
    }

    /// Accessor bound to `collection`.
    pub fn data(&mut self, collection: Collection) -> ProjectData<'_> {
        ProjectData::new(self, collection)
    }

    pub fn pokemon(&mut self) -> ProjectData<'_> {
        self.data(Collection::Pokemon)
    }

    pub fn moves(&mut self) -> ProjectData<'_> {
        self.data(Collection::Moves)
    }

    pub fn items(&mut self) -> ProjectData<'_> {
        self.data(Collection::Items)
    }

    pub fn quests(&mut self) -> ProjectData<'_> {
        self.data(Collection::Quests)
    }

    pub fn trainers(&mut self) -> ProjectData<'_> {
        self.data(Collection::Trainers)
    }

    pub fn types(&mut self) -> ProjectData<'_> {
        self.data(Collection::Types)
    }

    pub fn zones(&mut self) -> ProjectData<'_> {
        self.data(Collection::Zones)
    }

    pub fn abilities(&mut self) -> ProjectData<'_> {
        self.data(Collection::Abilities)
    }

    pub fn groups(&mut self) -> ProjectData<'_> {
        self.data(Collection::Groups)
    }

    pub fn dex(&mut self) -> ProjectData<'_> {
        self.data(Collection::Dex)
    }

    pub fn map_links(&mut self) -> ProjectData<'_> {
        self.data(Collection::MapLinks)
    }

    pub fn maps(&mut self) -> ProjectData<'_> {
        self.data(Collection::Maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_collection_reads_empty() {
        let snapshot = ProjectSnapshot::default();
        assert!(snapshot.collection(Collection::Maps).is_empty());
        assert!(snapshot.selected(Collection::Maps).db_symbol().is_undefined());
    }

    #[test]
    fn set_text_flags_file_and_swaps_snapshot() {
        let mut state = ProjectState::default();
        let before = state.snapshot();
        state.set_text(100_006, 0, "en", "Tackle");

        assert!(state.text_flags().is_dirty(100_006));
        assert!(state.has_pending_text_changes());
        assert!(!before.has_pending_text_changes());
        assert_eq!(state.snapshot().text().texts.get_text(100_006, 0, "en"), "Tackle");

        let tackle = Entity::from_value(json!({"klass": "Move", "id": 0, "dbSymbol": "tackle"})).unwrap();
        assert_eq!(state.snapshot().entity_name(Collection::Moves, &tackle), "Tackle");
    }
}
