use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::Collection;

/// What a save pass must do with a dirty entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaveIntent {
    Update,
    Delete,
}

impl SaveIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirtyKey {
    pub collection: Collection,
    pub id: String,
}

impl DirtyKey {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyEntry {
    pub intent: SaveIntent,
    /// Bumped every time the key is marked; lets a save pass tell whether the
    /// entry changed while it was in flight.
    pub revision: u64,
}

/// Pending-save intents accumulated since the last successful save.
///
/// One entry per key. Marking an already dirty key replaces its intent, so a
/// delete after an update leaves `Delete`, and an update after a delete (the
/// symbol was re-created) leaves `Update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    entries: BTreeMap<DirtyKey, DirtyEntry>,
    next_revision: u64,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, key: DirtyKey, intent: SaveIntent) {
        self.next_revision += 1;
        self.entries.insert(
            key,
            DirtyEntry {
                intent,
                revision: self.next_revision,
            },
        );
    }

    pub fn get(&self, key: &DirtyKey) -> Option<SaveIntent> {
        self.entries.get(key).map(|e| e.intent)
    }

    pub fn entry(&self, key: &DirtyKey) -> Option<&DirtyEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DirtyKey, &DirtyEntry)> {
        self.entries.iter()
    }

    /// Drop `key` only if it still holds the entry observed at `revision`.
    /// Returns whether the entry was removed.
    pub fn clear_if_unchanged(&mut self, key: &DirtyKey, revision: u64) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.revision == revision => {
                self.entries.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> DirtyKey {
        DirtyKey::new(Collection::Items, id)
    }

    #[test]
    fn repeated_updates_keep_one_entry() {
        let mut set = DirtySet::new();
        set.mark(key("potion"), SaveIntent::Update);
        set.mark(key("potion"), SaveIntent::Update);
        set.mark(key("potion"), SaveIntent::Update);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&key("potion")), Some(SaveIntent::Update));
    }

    #[test]
    fn delete_overrides_update() {
        let mut set = DirtySet::new();
        set.mark(key("potion"), SaveIntent::Update);
        set.mark(key("potion"), SaveIntent::Delete);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&key("potion")), Some(SaveIntent::Delete));
    }

    #[test]
    fn recreated_symbol_becomes_update() {
        let mut set = DirtySet::new();
        set.mark(key("potion"), SaveIntent::Delete);
        set.mark(key("potion"), SaveIntent::Update);
        assert_eq!(set.get(&key("potion")), Some(SaveIntent::Update));
    }

    #[test]
    fn same_id_in_other_collection_is_distinct() {
        let mut set = DirtySet::new();
        set.mark(key("tackle"), SaveIntent::Update);
        set.mark(DirtyKey::new(Collection::Moves, "tackle"), SaveIntent::Delete);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn clear_if_unchanged_respects_remarks() {
        let mut set = DirtySet::new();
        set.mark(key("potion"), SaveIntent::Update);
        let observed = set.entry(&key("potion")).unwrap().revision;

        set.mark(key("potion"), SaveIntent::Update);
        assert!(!set.clear_if_unchanged(&key("potion"), observed));
        assert_eq!(set.len(), 1);

        let latest = set.entry(&key("potion")).unwrap().revision;
        assert!(set.clear_if_unchanged(&key("potion"), latest));
        assert!(set.is_empty());
    }
}
