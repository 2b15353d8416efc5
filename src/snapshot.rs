//! Serializable copies of the tree and invariant-checked restore.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backends::MemoryFileSystem;
use crate::config::StoreConfig;
use crate::error::{FsError, FsResult};
use crate::types::{FileSystemItem, ItemId};
use crate::validation::validate_file_name;

/// Flat list of every item; the root is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub items: Vec<FileSystemItem>,
}

impl TreeSnapshot {
    pub fn to_json(&self) -> FsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> FsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the structural rules a live store maintains.
    pub fn validate(&self, config: &StoreConfig) -> FsResult<()> {
        let mut by_id: HashMap<ItemId, &FileSystemItem> = HashMap::new();
        for item in &self.items {
            if by_id.insert(item.id, item).is_some() {
                return Err(FsError::Snapshot(format!("duplicate id {}", item.id)));
            }
        }

        let mut sibling_keys: HashSet<(Option<ItemId>, String)> = HashSet::new();
        for item in &self.items {
            let verdict = validate_file_name(&item.name, config);
            if !verdict.valid || item.name.trim() != item.name {
                return Err(FsError::Snapshot(format!(
                    "item {} has an invalid name '{}'",
                    item.id, item.name
                )));
            }
            if item.is_folder() && (item.size.is_some() || item.mime_type.is_some()) {
                return Err(FsError::Snapshot(format!(
                    "folder {} carries file metadata",
                    item.id
                )));
            }
            if item.is_file() && item.size.is_none() {
                return Err(FsError::Snapshot(format!("file {} has no size", item.id)));
            }
            if let Some(parent) = item.parent_id {
                match by_id.get(&parent) {
                    Some(p) if p.is_folder() => {}
                    Some(_) => {
                        return Err(FsError::Snapshot(format!(
                            "item {} is parented to a file",
                            item.id
                        )));
                    }
                    None => {
                        return Err(FsError::Snapshot(format!(
                            "item {} has missing parent {parent}",
                            item.id
                        )));
                    }
                }
            }
            if !sibling_keys.insert((item.parent_id, config.name_case.key(&item.name))) {
                return Err(FsError::Snapshot(format!(
                    "duplicate name '{}' under the same folder",
                    item.name
                )));
            }
        }

        // Every parent exists, so a chain longer than the item count loops.
        for item in &self.items {
            let mut cursor = item.parent_id;
            let mut steps = 0;
            while let Some(id) = cursor {
                steps += 1;
                if steps > self.items.len() {
                    return Err(FsError::Snapshot(format!(
                        "cycle through item {}",
                        item.id
                    )));
                }
                cursor = by_id.get(&id).and_then(|p| p.parent_id);
            }
        }

        Ok(())
    }
}

impl MemoryFileSystem {
    pub fn snapshot(&self) -> TreeSnapshot {
        let mut items: Vec<FileSystemItem> = self.items().cloned().collect();
        items.sort_by_key(|item| (item.created_at, item.id));
        TreeSnapshot { items }
    }

    /// Rebuild a store positioned at the root with nothing selected.
    pub fn from_snapshot(snapshot: TreeSnapshot, config: StoreConfig) -> FsResult<Self> {
        snapshot.validate(&config)?;
        let count = snapshot.items.len();
        let fs = MemoryFileSystem::from_checked_items(snapshot.items, config);
        info!(items = count, "Restored tree from snapshot");
        Ok(fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileSystemStore;

    fn sample() -> MemoryFileSystem {
        let mut fs = MemoryFileSystem::new();
        let reports = fs.create_folder("Reports", None).unwrap();
        let q1 = fs.create_folder("Q1", Some(reports.id)).unwrap();
        fs.upload_file("data.csv", 1024, "text/csv", Some(q1.id)).unwrap();
        fs
    }

    #[test]
    fn test_snapshot_restore_preserves_tree() {
        let fs = sample();
        let json = fs.snapshot().to_json().unwrap();

        let snapshot = TreeSnapshot::from_json(&json).unwrap();
        let restored = MemoryFileSystem::from_snapshot(snapshot, StoreConfig::default()).unwrap();
        assert_eq!(restored.len(), 3);

        let root = restored.list_children(None).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "Reports");
        let q1 = restored.list_children(Some(root[0].id)).unwrap();
        let files = restored.list_children(Some(q1[0].id)).unwrap();
        assert_eq!(files[0].name, "data.csv");
        assert_eq!(files[0].size, Some(1024));
        assert_eq!(restored.current_folder(), None);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let mut fs = sample();
        let reports = fs.list_children(None).unwrap().remove(0);
        fs.rename_item(reports.id, "Archive").unwrap();
        let data = fs.search("data.csv").remove(0);
        fs.replace_file_content(data.id, 2048, "text/plain").unwrap();

        let json = fs.snapshot().to_json().unwrap();
        let snapshot = TreeSnapshot::from_json(&json).unwrap();
        let restored = MemoryFileSystem::from_snapshot(snapshot, StoreConfig::default()).unwrap();

        for item in fs.items() {
            assert_eq!(restored.get(item.id).unwrap(), item);
        }
        assert_eq!(restored.snapshot(), fs.snapshot());
    }

    #[test]
    fn test_rejects_orphan() {
        let mut snapshot = sample().snapshot();
        snapshot.items.retain(|item| item.name != "Q1");
        let err = snapshot.validate(&StoreConfig::default()).unwrap_err();
        assert!(matches!(err, FsError::Snapshot(_)));
    }

    #[test]
    fn test_rejects_cycle() {
        let mut a = FileSystemItem::new_folder("a", None);
        let b = FileSystemItem::new_folder("b", Some(a.id));
        a.parent_id = Some(b.id);
        let snapshot = TreeSnapshot { items: vec![a, b] };
        assert!(matches!(
            snapshot.validate(&StoreConfig::default()),
            Err(FsError::Snapshot(_))
        ));
    }

    #[test]
    fn test_rejects_sibling_clash_per_case_policy() {
        let snapshot = TreeSnapshot {
            items: vec![
                FileSystemItem::new_folder("Reports", None),
                FileSystemItem::new_folder("reports", None),
            ],
        };
        assert!(snapshot.validate(&StoreConfig::default()).is_err());
        let sensitive = StoreConfig::default().with_name_case(crate::config::NameCase::Sensitive);
        assert!(snapshot.validate(&sensitive).is_ok());
    }

    #[test]
    fn test_rejects_file_parent() {
        let file = FileSystemItem::new_file("a.txt", None, 1, "text/plain");
        let child = FileSystemItem::new_folder("inner", Some(file.id));
        let snapshot = TreeSnapshot {
            items: vec![file, child],
        };
        assert!(snapshot.validate(&StoreConfig::default()).is_err());
    }

    #[test]
    fn test_bad_json_is_snapshot_error() {
        assert!(matches!(
            TreeSnapshot::from_json("{not json"),
            Err(FsError::Snapshot(_))
        ));
    }
}
