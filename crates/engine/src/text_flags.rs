use std::collections::BTreeSet;

/// Text files edited since their last save.
///
/// Lives beside the project snapshot rather than inside it: text edits do
/// not go through the entity accessor, which only reads these flags to
/// refresh the snapshot's pending-text indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDirtyFlags {
    files: BTreeSet<u32>,
}

impl TextDirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, file_id: u32) {
        self.files.insert(file_id);
    }

    pub fn is_dirty(&self, file_id: u32) -> bool {
        self.files.contains(&file_id)
    }

    pub fn any(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = u32> + '_ {
        self.files.iter().copied()
    }

    pub fn clear(&mut self, file_id: u32) {
        self.files.remove(&file_id);
    }
}
