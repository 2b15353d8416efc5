//! Parent -> children index kept alongside the item arena.

use std::collections::HashMap;

use crate::types::ItemId;

/// Maps each folder (`None` for the root) to the ids of its direct children.
#[derive(Debug, Clone, Default)]
pub(super) struct ChildIndex {
    children: HashMap<Option<ItemId>, Vec<ItemId>>,
}

impl ChildIndex {
    pub fn insert(&mut self, parent: Option<ItemId>, child: ItemId) {
        self.children.entry(parent).or_default().push(child);
    }

    pub fn remove(&mut self, parent: Option<ItemId>, child: ItemId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|id| *id != child);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    /// Drop the entry for a folder that no longer exists.
    pub fn forget(&mut self, folder: ItemId) {
        self.children.remove(&Some(folder));
    }

    pub fn get(&self, parent: Option<ItemId>) -> &[ItemId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
