//! Core MemoryFileSystem implementation.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::backend::FileSystemStore;
use crate::config::StoreConfig;
use crate::error::{FsError, FsResult};
use crate::types::{FileSystemItem, ItemId, now_millis};
use crate::validation::{check_file_name, check_file_size};

use super::index::ChildIndex;

/// In-memory file tree with navigation and selection state
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    items: HashMap<ItemId, FileSystemItem>,
    children: ChildIndex,
    current: Option<ItemId>,
    selection: BTreeSet<ItemId>,
    config: StoreConfig,
}

impl MemoryFileSystem {
    /// Create an empty tree positioned at the root
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a store from items whose structure has already been checked.
    pub(crate) fn from_checked_items(items: Vec<FileSystemItem>, config: StoreConfig) -> Self {
        let mut fs = Self::with_config(config);
        for item in items {
            fs.children.insert(item.parent_id, item.id);
            fs.items.insert(item.id, item);
        }
        fs
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of items in the tree, root excluded
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in no particular order
    pub fn items(&self) -> impl Iterator<Item = &FileSystemItem> {
        self.items.values()
    }

    /// Go to the parent of the current folder; no-op at the root.
    pub fn navigate_up(&mut self) -> FsResult<()> {
        let parent = match self.current {
            Some(id) => self.get(id)?.parent_id,
            None => return Ok(()),
        };
        self.navigate_to(parent)
    }

    /// Select every child of the current folder.
    pub fn select_all(&mut self) {
        self.selection = self.children.get(self.current).iter().copied().collect();
    }

    /// Record replaced content for an existing file.
    pub fn replace_file_content(
        &mut self,
        id: ItemId,
        size: u64,
        mime_type: &str,
    ) -> FsResult<FileSystemItem> {
        check_file_size(size, &self.config)?;
        let item = self
            .items
            .get_mut(&id)
            .ok_or_else(|| FsError::NotFound(format!("item {id}")))?;
        if item.is_folder() {
            return Err(FsError::Validation(format!(
                "'{}' is a folder and has no content",
                item.name
            )));
        }

        item.size = Some(size);
        item.mime_type = Some(mime_type.to_string());
        item.updated_at = now_millis();
        debug!(item_id = %id, size, mime_type, "File content replaced");
        Ok(item.clone())
    }

    /// Display path such as `/Reports/Q1/data.csv`.
    pub fn path_of(&self, id: ItemId) -> FsResult<String> {
        let mut names: Vec<&str> = self
            .ancestry(id)?
            .into_iter()
            .filter_map(|ancestor| self.items.get(&ancestor).map(|item| item.name.as_str()))
            .collect();
        names.reverse();
        Ok(format!("/{}", names.join("/")))
    }

    /// Case-insensitive substring search over every name in the tree.
    pub fn search(&self, query: &str) -> Vec<FileSystemItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<FileSystemItem> = self
            .items
            .values()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(display_order);
        found
    }

    /// Number of items transitively contained in `id` (0 for files).
    pub fn descendant_count(&self, id: ItemId) -> FsResult<usize> {
        self.get(id)?;
        Ok(self.subtree(id).len() - 1)
    }

    /// `id` followed by its ancestors, nearest first.
    fn ancestry(&self, id: ItemId) -> FsResult<Vec<ItemId>> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let item = self
                .items
                .get(&current)
                .ok_or_else(|| FsError::NotFound(format!("item {current}")))?;
            chain.push(current);
            cursor = item.parent_id;
        }
        Ok(chain)
    }

    /// Fails unless `folder_id` is the root or an existing folder.
    fn require_folder(&self, folder_id: Option<ItemId>) -> FsResult<()> {
        let Some(id) = folder_id else {
            return Ok(());
        };
        match self.items.get(&id) {
            Some(item) if item.is_folder() => Ok(()),
            Some(item) => Err(FsError::NotFound(format!(
                "'{}' is not a folder",
                item.name
            ))),
            None => Err(FsError::NotFound(format!("folder {id}"))),
        }
    }

    /// Fails if a sibling other than `except` already uses `name`.
    fn ensure_unique(
        &self,
        parent: Option<ItemId>,
        name: &str,
        except: Option<ItemId>,
    ) -> FsResult<()> {
        let key = self.config.name_case.key(name);
        let clash = self
            .children
            .get(parent)
            .iter()
            .filter(|id| Some(**id) != except)
            .filter_map(|id| self.items.get(id))
            .any(|sibling| self.config.name_case.key(&sibling.name) == key);
        if clash {
            Err(FsError::duplicate(name))
        } else {
            Ok(())
        }
    }

    fn insert(&mut self, item: FileSystemItem) -> FileSystemItem {
        self.children.insert(item.parent_id, item.id);
        self.items.insert(item.id, item.clone());
        item
    }

    /// `root` and everything below it, walked with an explicit stack.
    fn subtree(&self, root: ItemId) -> Vec<ItemId> {
        let mut collected = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            collected.push(id);
            stack.extend_from_slice(self.children.get(Some(id)));
        }
        collected
    }

    /// Drop selected ids that are no longer children of the current folder.
    fn prune_selection(&mut self) {
        let visible: HashSet<ItemId> = self.children.get(self.current).iter().copied().collect();
        self.selection.retain(|id| visible.contains(id));
    }
}

/// Folders first, then by name ignoring case, then by exact name.
fn display_order(a: &FileSystemItem, b: &FileSystemItem) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

impl FileSystemStore for MemoryFileSystem {
    fn list_children(&self, folder_id: Option<ItemId>) -> FsResult<Vec<FileSystemItem>> {
        self.require_folder(folder_id)?;
        let mut listed: Vec<FileSystemItem> = self
            .children
            .get(folder_id)
            .iter()
            .filter_map(|id| self.items.get(id))
            .cloned()
            .collect();
        listed.sort_by(display_order);
        Ok(listed)
    }

    fn get(&self, id: ItemId) -> FsResult<&FileSystemItem> {
        self.items
            .get(&id)
            .ok_or_else(|| FsError::NotFound(format!("item {id}")))
    }

    fn navigate_to(&mut self, folder_id: Option<ItemId>) -> FsResult<()> {
        self.require_folder(folder_id)?;
        self.current = folder_id;
        self.selection.clear();
        debug!(folder_id = ?folder_id, "Navigated");
        Ok(())
    }

    fn current_folder(&self) -> Option<ItemId> {
        self.current
    }

    fn breadcrumbs(&self) -> Vec<FileSystemItem> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let mut trail: Vec<FileSystemItem> = self
            .ancestry(current)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.items.get(&id).cloned())
            .collect();
        trail.reverse();
        trail
    }

    fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<ItemId>,
    ) -> FsResult<FileSystemItem> {
        let name = check_file_name(name, &self.config)?;
        self.require_folder(parent_id)?;
        self.ensure_unique(parent_id, &name, None)?;

        let folder = self.insert(FileSystemItem::new_folder(name, parent_id));
        debug!(item_id = %folder.id, parent_id = ?parent_id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    fn upload_file(
        &mut self,
        name: &str,
        size: u64,
        mime_type: &str,
        parent_id: Option<ItemId>,
    ) -> FsResult<FileSystemItem> {
        let name = check_file_name(name, &self.config)?;
        check_file_size(size, &self.config)?;
        self.require_folder(parent_id)?;
        self.ensure_unique(parent_id, &name, None)?;

        let file = self.insert(FileSystemItem::new_file(name, parent_id, size, mime_type));
        debug!(
            item_id = %file.id,
            parent_id = ?parent_id,
            name = %file.name,
            size,
            "File recorded"
        );
        Ok(file)
    }

    fn rename_item(&mut self, id: ItemId, new_name: &str) -> FsResult<FileSystemItem> {
        let item = self.get(id)?;
        let parent_id = item.parent_id;
        let new_name = check_file_name(new_name, &self.config)?;
        if item.name == new_name {
            return Ok(item.clone());
        }
        self.ensure_unique(parent_id, &new_name, Some(id))?;

        let item = self
            .items
            .get_mut(&id)
            .ok_or_else(|| FsError::NotFound(format!("item {id}")))?;
        item.name = new_name;
        item.updated_at = now_millis();
        debug!(item_id = %id, name = %item.name, "Item renamed");
        Ok(item.clone())
    }

    fn move_item(&mut self, id: ItemId, new_parent: Option<ItemId>) -> FsResult<FileSystemItem> {
        let item = self.get(id)?;
        let old_parent = item.parent_id;
        let name = item.name.clone();

        if let Some(target) = new_parent {
            let target_item = self
                .items
                .get(&target)
                .ok_or_else(|| FsError::NotFound(format!("folder {target}")))?;
            if !target_item.is_folder() {
                return Err(FsError::InvalidMove(format!(
                    "'{}' is not a folder",
                    target_item.name
                )));
            }
            if self.ancestry(target)?.contains(&id) {
                return Err(FsError::InvalidMove(format!(
                    "cannot move '{name}' into itself or one of its subfolders"
                )));
            }
        }
        if old_parent == new_parent {
            return Ok(item.clone());
        }
        self.ensure_unique(new_parent, &name, Some(id))?;

        self.children.remove(old_parent, id);
        self.children.insert(new_parent, id);
        let moved = match self.items.get_mut(&id) {
            Some(item) => {
                item.parent_id = new_parent;
                item.clone()
            }
            None => return Err(FsError::NotFound(format!("item {id}"))),
        };
        self.prune_selection();
        debug!(item_id = %id, from = ?old_parent, to = ?new_parent, "Item moved");
        Ok(moved)
    }

    fn delete_items(&mut self, ids: &[ItemId]) -> usize {
        // Nearest-first chain so the view can fall back to a surviving ancestor.
        let current_chain = match self.current {
            Some(current) => self.ancestry(current).unwrap_or_default(),
            None => Vec::new(),
        };

        let mut removed = 0;
        for &id in ids {
            let Some(parent) = self.items.get(&id).map(|item| item.parent_id) else {
                continue;
            };
            self.children.remove(parent, id);
            for doomed in self.subtree(id) {
                if let Some(item) = self.items.remove(&doomed) {
                    if item.is_folder() {
                        self.children.forget(doomed);
                    }
                    self.selection.remove(&doomed);
                    removed += 1;
                }
            }
        }

        if self.current.is_some_and(|current| !self.items.contains_key(&current)) {
            self.current = current_chain
                .into_iter()
                .find(|id| self.items.contains_key(id));
            self.selection.clear();
        }

        debug!(requested = ids.len(), removed, "Items deleted");
        removed
    }

    fn toggle_select(&mut self, id: ItemId) {
        if !self.children.get(self.current).contains(&id) {
            return;
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn selection(&self) -> &BTreeSet<ItemId> {
        &self.selection
    }
}
