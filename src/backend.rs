use std::collections::BTreeSet;

use crate::error::FsResult;
use crate::types::{FileSystemItem, ItemId, ViewMode};

/// Operations every tree backing exposes to the views.
///
/// All calls run to completion synchronously; a failed mutation leaves the
/// tree untouched. `None` as a folder id always means the root, never
/// "the current folder"; use the `*_here` methods to target the folder
/// being viewed.
pub trait FileSystemStore {
    /// Direct children of `folder_id`, folders first, then by name.
    fn list_children(&self, folder_id: Option<ItemId>) -> FsResult<Vec<FileSystemItem>>;

    fn get(&self, id: ItemId) -> FsResult<&FileSystemItem>;

    /// Move the view to `folder_id`; always clears the selection.
    fn navigate_to(&mut self, folder_id: Option<ItemId>) -> FsResult<()>;

    fn current_folder(&self) -> Option<ItemId>;

    /// Ancestor chain from the root down to the current folder, inclusive.
    /// Empty at the root.
    fn breadcrumbs(&self) -> Vec<FileSystemItem>;

    fn create_folder(&mut self, name: &str, parent_id: Option<ItemId>)
    -> FsResult<FileSystemItem>;

    fn upload_file(
        &mut self,
        name: &str,
        size: u64,
        mime_type: &str,
        parent_id: Option<ItemId>,
    ) -> FsResult<FileSystemItem>;

    fn rename_item(&mut self, id: ItemId, new_name: &str) -> FsResult<FileSystemItem>;

    fn move_item(&mut self, id: ItemId, new_parent: Option<ItemId>) -> FsResult<FileSystemItem>;

    /// Remove items and, for folders, their whole subtree. Unknown ids are
    /// skipped. Returns how many items were removed.
    fn delete_items(&mut self, ids: &[ItemId]) -> usize;

    fn toggle_select(&mut self, id: ItemId);

    fn clear_selection(&mut self);

    fn selection(&self) -> &BTreeSet<ItemId>;

    fn list_current(&self) -> FsResult<Vec<FileSystemItem>> {
        self.list_children(self.current_folder())
    }

    /// Create a folder inside the folder being viewed.
    fn create_folder_here(&mut self, name: &str) -> FsResult<FileSystemItem> {
        let parent = self.current_folder();
        self.create_folder(name, parent)
    }

    /// Record a file inside the folder being viewed.
    fn upload_file_here(
        &mut self,
        name: &str,
        size: u64,
        mime_type: &str,
    ) -> FsResult<FileSystemItem> {
        let parent = self.current_folder();
        self.upload_file(name, size, mime_type, parent)
    }

    fn mode(&self) -> ViewMode {
        if self.selection().is_empty() {
            ViewMode::Viewing
        } else {
            ViewMode::Selecting
        }
    }

    fn is_selected(&self, id: ItemId) -> bool {
        self.selection().contains(&id)
    }

    fn delete_selected(&mut self) -> usize {
        let ids: Vec<ItemId> = self.selection().iter().copied().collect();
        self.delete_items(&ids)
    }
}
