use std::sync::Arc;

use studio_core::{BoundEntity, Collection, DbSymbol, DirtyKey, Entity, SaveIntent, SelectedIdentifier};

use crate::error::EngineError;
use crate::navigation::{Direction, NavigationOrder, adjacent_identifier};
use crate::state::{CollectionMap, ProjectState};

/// Read/write access to one collection of the project.
///
/// This is the only path through which entities, the collection's selection
/// slot and the dirty set change. Every mutating call installs one new
/// snapshot or, when it fails, leaves the state untouched.
pub struct ProjectData<'a> {
    state: &'a mut ProjectState,
    collection: Collection,
}

impl<'a> ProjectData<'a> {
    pub(crate) fn new(state: &'a mut ProjectState, collection: Collection) -> Self {
        Self { state, collection }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn read(&self) -> Arc<CollectionMap> {
        self.state.current().collection(self.collection)
    }

    pub fn get(&self, db_symbol: &str) -> Option<Entity> {
        self.state
            .current()
            .entity(self.collection, db_symbol)
            .cloned()
    }

    pub fn selected(&self) -> SelectedIdentifier {
        self.state.current().selected(self.collection)
    }

    /// Replace the selection. The target is not checked for existence.
    pub fn set_selected(&mut self, selected: impl Into<SelectedIdentifier>) {
        let collection = self.collection;
        let selected = selected.into();
        self.state.transition(|next| {
            next.selection.insert(collection, selected);
        });
    }

    /// Store `entity` under `db_symbol`, optionally moving the selection in
    /// the same transition.
    ///
    /// The entity is marked for update only when its canonical JSON differs
    /// from the stored one. The collection is rebuilt either way.
    pub fn write(&mut self, db_symbol: &DbSymbol, entity: Entity, selected: Option<SelectedIdentifier>) {
        let collection = self.collection;
        let current = self.state.current();
        let changed = current
            .entity(collection, db_symbol.as_str())
            .map(Entity::canonical_json)
            != Some(entity.canonical_json());

        let mut entities = CollectionMap::clone(&current.collection(collection));
        entities.insert(db_symbol.clone(), entity);
        let pending_text = self.state.text_flags().any();

        self.state.transition(|next| {
            next.collections.insert(collection, Arc::new(entities));
            if let Some(selected) = selected {
                next.selection.insert(collection, selected);
            }
            if changed {
                next.dirty
                    .mark(DirtyKey::new(collection, db_symbol.as_str()), SaveIntent::Update);
            }
            next.has_pending_text_changes = pending_text;
        });

        if changed {
            tracing::debug!(%collection, id = %db_symbol, "entity marked for update");
        }
    }

    /// Lay the fields of `patch` over the stored entity and write the result.
    /// Without a stored entity the patch is written as is.
    pub fn patch(&mut self, db_symbol: &DbSymbol, patch: &Entity, selected: Option<SelectedIdentifier>) {
        let entity = match self.get(db_symbol.as_str()) {
            Some(stored) => stored.merged(patch),
            None => patch.clone(),
        };
        self.write(db_symbol, entity, selected);
    }

    /// Write back an entity handed out by [`ProjectData::bind`]. The text
    /// binding is dropped; it is never part of the saved record.
    pub fn write_bound(
        &mut self,
        db_symbol: &DbSymbol,
        bound: BoundEntity,
        selected: Option<SelectedIdentifier>,
    ) -> Result<(), EngineError> {
        if bound.collection != self.collection {
            return Err(EngineError::CollectionMismatch {
                expected: self.collection,
                actual: bound.collection,
            });
        }
        self.write(db_symbol, bound.into_entity(), selected);
        Ok(())
    }

    /// Pair `entity` with the project texts for display. Pure.
    pub fn bind(&self, entity: Entity) -> BoundEntity {
        BoundEntity {
            collection: self.collection,
            entity,
            text: self.state.current().text().clone(),
        }
    }

    /// Delete `db_symbol` and select `selected` in the same transition.
    ///
    /// `selected` must point at a different entity; otherwise nothing
    /// changes and [`EngineError::Precondition`] is returned.
    pub fn remove(&mut self, db_symbol: &DbSymbol, selected: SelectedIdentifier) -> Result<(), EngineError> {
        let collection = self.collection;
        if selected.db_symbol() == db_symbol {
            return Err(EngineError::Precondition(format!(
                "cannot delete {db_symbol} from {collection} while selecting {selected} as the replacement"
            )));
        }

        let current = self.state.current();
        let mut entities = CollectionMap::clone(&current.collection(collection));
        if entities.remove(db_symbol.as_str()).is_none() {
            tracing::warn!(%collection, id = %db_symbol, "deleting an entity that is not in the store");
        }

        self.state.transition(|next| {
            next.collections.insert(collection, Arc::new(entities));
            next.selection.insert(collection, selected);
            next.dirty
                .mark(DirtyKey::new(collection, db_symbol.as_str()), SaveIntent::Delete);
        });
        tracing::debug!(%collection, id = %db_symbol, "entity marked for deletion");
        Ok(())
    }

    /// Neighbor of the current selection in `order`.
    pub fn adjacent(&self, direction: Direction, order: NavigationOrder) -> DbSymbol {
        let snapshot = self.state.current();
        let selected = snapshot.selected(self.collection);
        let collection = self.collection;
        adjacent_identifier(
            &snapshot.collection(collection),
            selected.db_symbol().as_str(),
            direction,
            order,
            |entity| snapshot.entity_name(collection, entity),
        )
    }

    pub fn previous(&self, order: NavigationOrder) -> DbSymbol {
        self.adjacent(Direction::Previous, order)
    }

    pub fn next(&self, order: NavigationOrder) -> DbSymbol {
        self.adjacent(Direction::Next, order)
    }

    /// Move the selection to the neighbor in `order` and return it.
    pub fn select_adjacent(&mut self, direction: Direction, order: NavigationOrder) -> SelectedIdentifier {
        let target = SelectedIdentifier::for_collection(self.collection, self.adjacent(direction, order));
        self.set_selected(target.clone());
        target
    }
}
